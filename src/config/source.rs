use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::Category;
use crate::fetcher::extractor::DEFAULT_SELECTOR;
use crate::fetcher::http_transport::DEFAULT_REQUEST_TIMEOUT;
use crate::fetcher::DEFAULT_BASE_URL;
use crate::matcher::DEFAULT_PATTERNS;

/// Where user agents are scraped from and which ones are kept
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Reference page prefix; the category slug is appended
    pub base_url: String,

    /// CSS selector for the elements holding one user agent each
    pub selector: String,

    /// Browser categories scraped on every refresh
    pub categories: Vec<Category>,

    /// Case-insensitive patterns; a user agent is kept if any matches
    pub patterns: Vec<String>,

    /// Per-request HTTP timeout in seconds (default: 10)
    pub request_timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            selector: DEFAULT_SELECTOR.to_string(),
            categories: Category::ALL.to_vec(),
            patterns: DEFAULT_PATTERNS.iter().map(|p| p.to_string()).collect(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl SourceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Refresh timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Age after which the cached list is refreshed (default: 86400)
    pub freshness_window_secs: u64,

    /// Seconds between scheduled forced refreshes (default: 86400)
    pub interval_secs: u64,

    /// Overall budget for one refresh cycle in seconds (default: 30)
    pub deadline_secs: u64,

    /// Refresh at startup when the cached list is stale (default: true)
    pub refresh_on_start: bool,

    /// Seconds between re-reads of the cache file by the daemon; 0 disables
    /// (default: 60)
    pub reload_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            freshness_window_secs: 86400,
            interval_secs: 86400,
            deadline_secs: 30,
            refresh_on_start: true,
            reload_interval_secs: 60,
        }
    }
}

impl RefreshConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn reload_interval(&self) -> Option<Duration> {
        (self.reload_interval_secs > 0).then(|| Duration::from_secs(self.reload_interval_secs))
    }
}
