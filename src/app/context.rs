use std::sync::Arc;

use crate::app::error::{MimicError, Result};
use crate::cache::AgentCache;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpTransport, ScrapingFetcher};
use crate::refresh::{RefreshCoordinator, RefreshOutcome};
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
use crate::store::{JsonFileStore, SnapshotStore};

/// Owns the cache and everything that refreshes it.
///
/// Built once per process and shared by handle; query methods never fail.
pub struct AppContext {
    pub cache: Arc<AgentCache>,
    pub coordinator: Arc<RefreshCoordinator>,
    scheduler_config: SchedulerConfig,
}

impl AppContext {
    /// Wire the HTTP scraper and JSON file store described by `config`.
    pub fn new(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| MimicError::Config(e.to_string()))?;

        let cache_file = match &config.storage.cache_file {
            Some(path) => path.clone(),
            None => JsonFileStore::default_path()?,
        };
        let store: Arc<dyn SnapshotStore> = Arc::new(JsonFileStore::new(cache_file));

        let cache = Arc::new(AgentCache::with_settings(
            config.refresh.freshness_window(),
            config.default_agent.clone(),
        ));

        let transport = Arc::new(HttpTransport::with_timeout(config.source.request_timeout())?);
        let base_url = config
            .base_url()
            .map_err(|e| MimicError::Config(e.to_string()))?;
        let matcher = config
            .matcher()
            .map_err(|e| MimicError::Config(e.to_string()))?;
        let extractor = config
            .extractor()
            .map_err(|e| MimicError::Config(e.to_string()))?;
        let fetcher: Arc<dyn Fetcher> = Arc::new(
            ScrapingFetcher::new(transport, cache.clone())
                .with_base_url(base_url)
                .with_matcher(matcher)
                .with_extractor(extractor),
        );

        Self::from_parts(cache, fetcher, store, config)
    }

    /// Wire caller-supplied components, seeding the cache from `store`.
    ///
    /// A store that fails to load is logged and the cache starts empty.
    pub fn from_parts(
        cache: Arc<AgentCache>,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn SnapshotStore>,
        config: &Config,
    ) -> Result<Self> {
        let matcher = config
            .matcher()
            .map_err(|e| MimicError::Config(e.to_string()))?;
        let coordinator = Arc::new(
            RefreshCoordinator::new(cache.clone(), fetcher, store)
                .with_matcher(matcher)
                .with_categories(config.source.categories.clone())
                .with_deadline(config.refresh.deadline()),
        );

        match coordinator.reload() {
            Ok(true) => tracing::debug!("Loaded {} cached user agents", cache.count()),
            Ok(false) => tracing::debug!("No cached user agents yet"),
            Err(e) => tracing::warn!("Failed to load cached user agents, starting empty: {}", e),
        }

        Ok(Self {
            cache,
            coordinator,
            scheduler_config: SchedulerConfig {
                interval: config.refresh.interval(),
                refresh_on_start: config.refresh.refresh_on_start,
                reload_interval: config.refresh.reload_interval(),
            },
        })
    }

    pub fn random_agent(&self) -> String {
        self.cache.random_agent()
    }

    pub fn random_agent_filtered(&self, os: &str, browser: &str) -> String {
        self.cache.random_agent_filtered(os, browser)
    }

    pub fn all_agents(&self) -> Vec<String> {
        self.cache.all_agents()
    }

    pub fn count(&self) -> usize {
        self.cache.count()
    }

    pub fn is_fresh(&self) -> bool {
        self.cache.is_fresh()
    }

    pub async fn refresh(&self, force: bool) -> Result<RefreshOutcome> {
        self.coordinator.refresh(force).await
    }

    /// Re-read the store and adopt its snapshot if it is newer.
    pub fn reload(&self) -> Result<bool> {
        self.coordinator.reload()
    }

    /// Start the background refresh loop with the configured interval.
    pub fn spawn_scheduler(&self) -> SchedulerHandle {
        self.spawn_scheduler_with(self.scheduler_config.clone())
    }

    pub fn spawn_scheduler_with(&self, config: SchedulerConfig) -> SchedulerHandle {
        Scheduler::new(self.coordinator.clone(), config).spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    use crate::domain::{Category, Snapshot};
    use crate::store::MemoryStore;
    use crate::testing::{agents, StubFetcher};

    #[test]
    fn test_from_parts_seeds_cache_from_store() {
        let stored = Snapshot::new(agents("stored", 3), Some(Utc::now()));
        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            Arc::new(StubFetcher::uniform(agents("fresh", 1))),
            Arc::new(MemoryStore::with_snapshot(stored)),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(ctx.count(), 3);
        assert!(ctx.is_fresh());
        assert!(ctx.random_agent().contains("stored"));
    }

    #[tokio::test]
    async fn test_fresh_stored_list_skips_startup_refresh() {
        let fetcher = Arc::new(StubFetcher::uniform(agents("fresh", 1)));
        let stored = Snapshot::new(agents("stored", 3), Some(Utc::now()));
        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            fetcher.clone(),
            Arc::new(MemoryStore::with_snapshot(stored)),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(ctx.refresh(false).await.unwrap(), RefreshOutcome::Skipped);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_stored_list_is_replaced() {
        let stored = Snapshot::new(
            agents("stored", 3),
            Some(Utc::now() - TimeDelta::hours(25)),
        );
        let store = Arc::new(MemoryStore::with_snapshot(stored));
        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            Arc::new(StubFetcher::uniform(agents("fresh", 2))),
            store.clone(),
            &Config::default(),
        )
        .unwrap();
        assert!(!ctx.is_fresh());

        ctx.refresh(false).await.unwrap();

        assert_eq!(ctx.count(), 2);
        assert!(ctx.all_agents().iter().all(|a| a.contains("fresh")));
        assert_eq!(store.stored().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_configured_categories_are_used() {
        let fetcher = Arc::new(StubFetcher::uniform(agents("ua", 2)));
        let mut config = Config::default();
        config.source.categories = vec![Category::Safari];

        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            fetcher.clone(),
            Arc::new(MemoryStore::new()),
            &config,
        )
        .unwrap();
        ctx.refresh(true).await.unwrap();

        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_store_starts_empty_then_refreshes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user-agents.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let config = Config::default();
        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            Arc::new(StubFetcher::uniform(agents("fresh", 2))),
            Arc::new(JsonFileStore::new(&path)),
            &config,
        )
        .unwrap();

        assert_eq!(ctx.count(), 0);
        assert_eq!(ctx.random_agent(), config.default_agent);
        assert!(!ctx.is_fresh());

        ctx.refresh(false).await.unwrap();

        assert_eq!(ctx.count(), 2);
        assert!(ctx.is_fresh());
        // The refresh overwrote the corrupt file.
        assert_eq!(JsonFileStore::new(&path).load().unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stored_foreign_agents_are_filtered_and_refreshed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user-agents.json");
        std::fs::write(
            &path,
            r#"{"user-agent":["curl/8.0","wget/1"],"last-update":"2999-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let fetcher = Arc::new(StubFetcher::uniform(agents("fresh", 2)));
        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            fetcher.clone(),
            Arc::new(JsonFileStore::new(&path)),
            &Config::default(),
        )
        .unwrap();

        assert_eq!(ctx.count(), 0);
        assert!(!ctx.is_fresh());

        ctx.refresh(false).await.unwrap();
        assert_eq!(fetcher.calls(), 4);
        assert!(ctx.all_agents().iter().all(|a| a.contains("fresh")));
    }

    #[test]
    fn test_reload_adopts_list_written_by_another_process() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user-agents.json");
        let ctx = AppContext::from_parts(
            Arc::new(AgentCache::new()),
            Arc::new(StubFetcher::uniform(agents("unused", 1))),
            Arc::new(JsonFileStore::new(&path)),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(ctx.count(), 0);

        let other = JsonFileStore::new(&path);
        other
            .save(&Snapshot::new(agents("other", 3), Some(Utc::now())))
            .unwrap();

        assert!(ctx.reload().unwrap());
        assert_eq!(ctx.count(), 3);
        assert!(ctx.is_fresh());
    }

    #[test]
    fn test_new_with_temp_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.cache_file = Some(dir.path().join("user-agents.json"));

        let ctx = AppContext::new(&config).unwrap();

        assert_eq!(ctx.count(), 0);
        assert_eq!(ctx.random_agent(), config.default_agent);
    }
}
