//! Shared in-memory user-agent cache.
//!
//! The current [`Snapshot`] sits behind an `RwLock<Arc<_>>`: readers clone the
//! `Arc` and drop the lock straight away, the writer swaps the pointer. A
//! reader therefore sees either the old snapshot or the new one, never a mix.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;

use crate::domain::Snapshot;
use crate::matcher::PatternMatcher;

/// Returned by reads when the cache has nothing better to offer.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/109.0";

/// Snapshots younger than this are not refreshed unless forced.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

pub struct AgentCache {
    snapshot: RwLock<Arc<Snapshot>>,
    freshness_window: Duration,
    default_agent: String,
}

impl AgentCache {
    pub fn new() -> Self {
        Self::with_settings(DEFAULT_FRESHNESS_WINDOW, DEFAULT_USER_AGENT)
    }

    pub fn with_settings(freshness_window: Duration, default_agent: impl Into<String>) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            freshness_window,
            default_agent: default_agent.into(),
        }
    }

    /// Current snapshot. Never blocks on other readers.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn random_agent(&self) -> String {
        let snapshot = self.snapshot();
        pick(snapshot.agents())
            .cloned()
            .unwrap_or_else(|| self.default_agent.clone())
    }

    /// Random agent containing both `os` and `browser`, compared
    /// case-insensitively. Falls back to the default agent when nothing matches.
    pub fn random_agent_filtered(&self, os: &str, browser: &str) -> String {
        let os = os.to_lowercase();
        let browser = browser.to_lowercase();
        let snapshot = self.snapshot();

        let matching: Vec<&String> = snapshot
            .agents()
            .iter()
            .filter(|agent| {
                let agent = agent.to_lowercase();
                agent.contains(&os) && agent.contains(&browser)
            })
            .collect();

        pick(&matching)
            .map(|agent| (*agent).clone())
            .unwrap_or_else(|| self.default_agent.clone())
    }

    pub fn all_agents(&self) -> Vec<String> {
        self.snapshot().agents().to_vec()
    }

    pub fn count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.snapshot().last_update()
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    /// A timestamp ahead of `now` counts as stale.
    fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        let window = TimeDelta::from_std(self.freshness_window).unwrap_or(TimeDelta::MAX);
        self.last_update().is_some_and(|ts| {
            let age = now.signed_duration_since(ts);
            age >= TimeDelta::zero() && age < window
        })
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    /// Install a new list as one unit. Only the refresh coordinator calls this.
    pub(crate) fn replace<I, S>(&self, agents: I, timestamp: DateTime<Utc>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.install(Snapshot::new(agents, Some(timestamp)));
    }

    /// Install a snapshot read from storage if it is newer than the current
    /// one (or the cache is empty). Returns whether it was installed.
    ///
    /// Entries `matcher` rejects are dropped. If any were dropped the
    /// timestamp is cleared too, so the next unforced refresh runs.
    pub(crate) fn seed(&self, snapshot: Snapshot, matcher: &PatternMatcher) -> bool {
        let snapshot = snapshot.normalized();
        let loaded_at = snapshot.last_update();
        let total = snapshot.len();
        let kept: Vec<String> = snapshot
            .agents()
            .iter()
            .filter(|agent| matcher.matches(agent))
            .cloned()
            .collect();

        let last_update = if kept.len() == total {
            loaded_at
        } else {
            tracing::warn!(
                "Dropped {} stored user agents that no longer match the configured patterns",
                total - kept.len()
            );
            None
        };
        let snapshot = Arc::new(Snapshot::new(kept, last_update));

        let mut guard = match self.snapshot.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let newer = match (loaded_at, guard.last_update()) {
            (Some(loaded), Some(current)) => loaded > current,
            (Some(_), None) => true,
            (None, _) => guard.is_empty(),
        };
        if newer {
            *guard = snapshot;
        }
        newer
    }

    fn install(&self, snapshot: Snapshot) {
        // Built outside the lock so the write section is a pointer swap.
        let snapshot = Arc::new(snapshot);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

impl Default for AgentCache {
    fn default() -> Self {
        Self::new()
    }
}

fn pick<T>(items: &[T]) -> Option<&T> {
    if items.is_empty() {
        return None;
    }
    let idx = rand::rng().random_range(0..items.len());
    items.get(idx)
}
