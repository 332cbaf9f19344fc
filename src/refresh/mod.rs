//! Refresh cycles: fan out one fetch per category, merge, commit.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::app::{MimicError, Result};
use crate::cache::AgentCache;
use crate::domain::Category;
use crate::fetcher::Fetcher;
use crate::matcher::PatternMatcher;
use crate::store::SnapshotStore;

/// Overall budget for one refresh cycle, shared by every category fetch.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cache was fresh and the refresh was not forced.
    Skipped,
    /// A new snapshot was committed. `failed` lists categories whose fetch
    /// failed or whose task panicked; their agents are missing from this
    /// snapshot.
    Refreshed {
        agents: usize,
        failed: Vec<Category>,
    },
}

struct Merged {
    agents: BTreeSet<String>,
    failed: Vec<Category>,
    failures: usize,
    last_error: Option<MimicError>,
}

pub struct RefreshCoordinator {
    cache: Arc<AgentCache>,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn SnapshotStore>,
    matcher: PatternMatcher,
    categories: Vec<Category>,
    deadline: Duration,
    in_flight: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(
        cache: Arc<AgentCache>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        Self {
            cache,
            fetcher,
            store,
            matcher: PatternMatcher::default(),
            categories: Category::ALL.to_vec(),
            deadline: DEFAULT_DEADLINE,
            in_flight: Mutex::new(()),
        }
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Patterns applied to snapshots read back from the store.
    pub fn with_matcher(mut self, matcher: PatternMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Pick up a snapshot written to the store since the cache was last
    /// updated, e.g. by `mimic refresh` in another process. Returns whether
    /// the cache changed.
    pub fn reload(&self) -> Result<bool> {
        match self.store.load()? {
            Some(snapshot) => Ok(self.cache.seed(snapshot, &self.matcher)),
            None => Ok(false),
        }
    }

    /// Refresh unless the cache is fresh and `force` is false.
    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome> {
        self.refresh_with_cancel(force, &CancellationToken::new()).await
    }

    /// Like [`refresh`](Self::refresh), abandoning the cycle when `parent` is
    /// cancelled.
    pub async fn refresh_with_cancel(
        &self,
        force: bool,
        parent: &CancellationToken,
    ) -> Result<RefreshOutcome> {
        if !force && self.cache.is_fresh() {
            tracing::debug!("User agents are fresh, skipping refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        let _guard = self.in_flight.lock().await;

        // Another caller may have refreshed while we waited.
        if !force && self.cache.is_fresh() {
            tracing::debug!("User agents refreshed concurrently, skipping refresh");
            return Ok(RefreshOutcome::Skipped);
        }

        if self.categories.is_empty() {
            return Err(MimicError::Config("No browser categories configured".into()));
        }

        let cancel = parent.child_token();
        let merged = match tokio::time::timeout(self.deadline, self.fetch_all(&cancel)).await {
            Ok(merged) => merged,
            Err(_) => {
                cancel.cancel();
                tracing::warn!("Refresh exceeded its {:?} deadline", self.deadline);
                return Err(MimicError::Timeout(self.deadline));
            }
        };

        if parent.is_cancelled() {
            return Err(MimicError::Cancelled);
        }

        self.commit(merged)
    }

    async fn fetch_all(&self, cancel: &CancellationToken) -> Merged {
        let mut tasks = JoinSet::new();
        // A panicked task loses its return value, so keep the category by id.
        let mut spawned = HashMap::new();

        for &category in &self.categories {
            let fetcher = self.fetcher.clone();
            let cancel = cancel.clone();
            let handle = tasks.spawn(async move {
                let result = fetcher.fetch(&cancel, category).await;
                (category, result)
            });
            spawned.insert(handle.id(), category);
        }

        let mut merged = Merged {
            agents: BTreeSet::new(),
            failed: Vec::new(),
            failures: 0,
            last_error: None,
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((category, Ok(agents))) => {
                    tracing::debug!("Fetched {} user agents for {}", agents.len(), category);
                    merged.agents.extend(agents);
                }
                Ok((category, Err(e))) => {
                    tracing::warn!("Failed to fetch user agents for {}: {}", category, e);
                    merged.failed.push(category);
                    merged.failures += 1;
                    merged.last_error = Some(e);
                }
                Err(e) => {
                    match spawned.get(&e.id()) {
                        Some(&category) => {
                            tracing::error!("Fetch task for {} failed: {}", category, e);
                            merged.failed.push(category);
                        }
                        None => tracing::error!("Task join error: {}", e),
                    }
                    merged.failures += 1;
                    merged.last_error = Some(MimicError::Other(e.to_string()));
                }
            }
        }

        merged
    }

    /// Partial results are committed as long as one category succeeded and
    /// produced agents. Otherwise the cache keeps its current snapshot.
    fn commit(&self, merged: Merged) -> Result<RefreshOutcome> {
        if merged.failures == self.categories.len() {
            let source = merged
                .last_error
                .unwrap_or_else(|| MimicError::Other("unknown fetch failure".into()));
            return Err(MimicError::AllCategoriesFailed {
                count: merged.failures,
                source: Box::new(source),
            });
        }

        if merged.agents.is_empty() {
            return Err(MimicError::Parse(
                "No matching user agents found in any category".into(),
            ));
        }

        let count = merged.agents.len();
        self.cache.replace(merged.agents, Utc::now());
        tracing::info!(
            "Refreshed user agents: {} cached, {} categories failed",
            count,
            merged.failed.len()
        );

        let snapshot = self.cache.snapshot();
        if let Err(e) = self.store.save(&snapshot) {
            tracing::error!("Failed to persist user agents: {}", e);
            return Err(e);
        }

        Ok(RefreshOutcome::Refreshed {
            agents: count,
            failed: merged.failed,
        })
    }
}
