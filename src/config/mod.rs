//! Configuration management for mimic.
//!
//! Configuration is read from `~/.config/mimic/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod source;

pub use source::{RefreshConfig, SourceConfig};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::cache::DEFAULT_USER_AGENT;
use crate::fetcher::Extractor;
use crate::matcher::PatternMatcher;

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Cache file location (default: `<data_dir>/mimic/user-agents.json`)
    pub cache_file: Option<PathBuf>,
}

/// Main configuration struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Served when the cache is empty or a filter matches nothing
    pub default_agent: String,
    pub source: SourceConfig,
    pub refresh: RefreshConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_agent: DEFAULT_USER_AGENT.to_string(),
            source: SourceConfig::default(),
            refresh: RefreshConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating a commented default if missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/mimic/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("mimic").join("config.toml"))
    }

    /// Check the values that would otherwise only fail at refresh time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        self.matcher()?;
        self.extractor()?;

        if self.default_agent.trim().is_empty() {
            return Err(ConfigError::Invalid("default_agent must not be empty".into()));
        }
        if self.source.categories.is_empty() {
            return Err(ConfigError::Invalid("source.categories must not be empty".into()));
        }
        if self.refresh.deadline_secs == 0 {
            return Err(ConfigError::Invalid("refresh.deadline_secs must be positive".into()));
        }
        if self.refresh.interval_secs == 0 {
            return Err(ConfigError::Invalid("refresh.interval_secs must be positive".into()));
        }
        Ok(())
    }

    /// Source base URL, normalized to end in `/` so slugs join as a path segment.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.source.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw)
            .map_err(|e| ConfigError::Invalid(format!("source.base_url '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "source.base_url must use http or https, got '{}'",
                other
            ))),
        }
    }

    pub fn matcher(&self) -> Result<PatternMatcher, ConfigError> {
        PatternMatcher::new(&self.source.patterns)
            .map_err(|e| ConfigError::Invalid(format!("source.patterns: {}", e)))
    }

    pub fn extractor(&self) -> Result<Extractor, ConfigError> {
        Extractor::new(&self.source.selector)
            .map_err(|e| ConfigError::Invalid(format!("source.selector: {}", e)))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, Self::default_config_content()).map_err(io_error)
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# mimic configuration

# Returned when the cache is empty or no cached agent matches a filter
default_agent = "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/109.0"

[source]
# Reference page prefix; the browser name is appended
base_url = "https://www.whatismybrowser.com/guides/the-latest-user-agent/"

# CSS selector for the elements holding one user agent each
selector = "td li span.code"

# Browsers scraped on every refresh: chrome, firefox, safari, edge
categories = ["chrome", "firefox", "safari", "edge"]

# A scraped string is kept if any of these (case-insensitive) patterns match
patterns = [
    'windows nt \d+\.\d+',
    'macintosh',
    'linux (x86_64|i686)',
]

# Per-request HTTP timeout in seconds
request_timeout_secs = 10

[refresh]
# Age in seconds after which the cached list is considered stale
freshness_window_secs = 86400

# Seconds between scheduled refreshes
interval_secs = 86400

# Overall budget for one refresh in seconds
deadline_secs = 30

# Refresh at startup when the cached list is stale
refresh_on_start = true

# Seconds between daemon re-reads of the cache file, so a list written by
# `mimic refresh` in another process is picked up; 0 disables
reload_interval_secs = 60

[storage]
# Where the scraped list is kept between runs
# cache_file = "/home/me/.local/share/mimic/user-agents.json"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
