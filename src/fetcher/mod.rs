pub mod extractor;
pub mod http_transport;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::app::{MimicError, Result};
use crate::cache::AgentCache;
use crate::domain::Category;
use crate::matcher::PatternMatcher;

pub use extractor::Extractor;
pub use http_transport::HttpTransport;

pub const DEFAULT_BASE_URL: &str = "https://www.whatismybrowser.com/guides/the-latest-user-agent/";

/// One remote retrieval. Implementations only move bytes; cancellation is
/// handled by the caller dropping the future.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn retrieve(&self, url: &str, user_agent: &str) -> Result<String>;
}

/// Produces the matching user agents for one category.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, cancel: &CancellationToken, category: Category)
        -> Result<HashSet<String>>;
}

/// Fetches a category's reference page and keeps the strings the matcher accepts.
pub struct ScrapingFetcher {
    transport: Arc<dyn Transport>,
    cache: Arc<AgentCache>,
    extractor: Extractor,
    matcher: PatternMatcher,
    base_url: Url,
}

impl ScrapingFetcher {
    pub fn new(transport: Arc<dyn Transport>, cache: Arc<AgentCache>) -> Self {
        Self {
            transport,
            cache,
            extractor: Extractor::default(),
            matcher: PatternMatcher::default(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_matcher(mut self, matcher: PatternMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn category_url(&self, category: Category) -> Result<Url> {
        self.base_url
            .join(category.slug())
            .map_err(|e| MimicError::Config(format!("Invalid source URL: {}", e)))
    }

    fn filter(&self, html: &str) -> Result<HashSet<String>> {
        Ok(self
            .extractor
            .extract(html)?
            .into_iter()
            .filter(|candidate| self.matcher.matches(candidate))
            .map(|candidate| candidate.trim().to_string())
            .collect())
    }
}

#[async_trait]
impl Fetcher for ScrapingFetcher {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        category: Category,
    ) -> Result<HashSet<String>> {
        let url = self.category_url(category)?;
        // Borrow an agent from the current pool so requests vary.
        let user_agent = self.cache.random_agent();

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(MimicError::Cancelled),
            body = self.transport.retrieve(url.as_str(), &user_agent) => body?,
        };

        let agents = self.filter(&body)?;
        tracing::debug!("Extracted {} user agents for {}", agents.len(), category);
        Ok(agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Utc;

    use crate::cache::DEFAULT_USER_AGENT;
    use crate::testing::reference_page;

    struct RecordingTransport {
        body: String,
        delay: Duration,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingTransport {
        fn new(body: String) -> Self {
            Self {
                body,
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn retrieve(&self, url: &str, user_agent: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), user_agent.to_string()));
            tokio::time::sleep(self.delay).await;
            Ok(self.body.clone())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Transport for FailingTransport {
        async fn retrieve(&self, url: &str, _user_agent: &str) -> Result<String> {
            Err(MimicError::Transport(format!("connection refused: {}", url)))
        }
    }

    #[test]
    fn test_default_base_url_joins_slugs() {
        let fetcher =
            ScrapingFetcher::new(Arc::new(FailingTransport), Arc::new(AgentCache::new()));
        assert_eq!(
            fetcher.category_url(Category::Firefox).unwrap().as_str(),
            "https://www.whatismybrowser.com/guides/the-latest-user-agent/firefox"
        );
    }

    #[tokio::test]
    async fn test_fetch_keeps_only_matching_agents() {
        let transport = Arc::new(RecordingTransport::new(reference_page()));
        let fetcher = ScrapingFetcher::new(transport.clone(), Arc::new(AgentCache::new()));

        let agents = fetcher
            .fetch(&CancellationToken::new(), Category::Chrome)
            .await
            .unwrap();

        assert_eq!(agents.len(), 5);
        assert!(agents.iter().all(|a| !a.contains("iPhone") && !a.contains("Android")));
    }

    #[tokio::test]
    async fn test_fetch_uses_default_agent_when_cache_empty() {
        let transport = Arc::new(RecordingTransport::new(reference_page()));
        let fetcher = ScrapingFetcher::new(transport.clone(), Arc::new(AgentCache::new()));

        fetcher
            .fetch(&CancellationToken::new(), Category::Safari)
            .await
            .unwrap();

        let calls = transport.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.ends_with("/safari"));
        assert_eq!(calls[0].1, DEFAULT_USER_AGENT);
    }

    #[tokio::test]
    async fn test_fetch_uses_agent_from_cache() {
        let cache = Arc::new(AgentCache::new());
        cache.replace(vec!["Mozilla/5.0 (Macintosh) cached"], Utc::now());
        let transport = Arc::new(RecordingTransport::new(reference_page()));
        let fetcher = ScrapingFetcher::new(transport.clone(), cache);

        fetcher
            .fetch(&CancellationToken::new(), Category::Edge)
            .await
            .unwrap();

        assert_eq!(
            transport.calls.lock().unwrap()[0].1,
            "Mozilla/5.0 (Macintosh) cached"
        );
    }

    #[tokio::test]
    async fn test_fetch_returns_cancelled_when_token_fires() {
        let mut transport = RecordingTransport::new(reference_page());
        transport.delay = Duration::from_secs(30);
        let fetcher = ScrapingFetcher::new(Arc::new(transport), Arc::new(AgentCache::new()));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = fetcher.fetch(&cancel, Category::Chrome).await;
        assert!(matches!(result, Err(MimicError::Cancelled)));
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let fetcher =
            ScrapingFetcher::new(Arc::new(FailingTransport), Arc::new(AgentCache::new()));
        let result = fetcher.fetch(&CancellationToken::new(), Category::Chrome).await;
        assert!(matches!(result, Err(MimicError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unexpected_page_is_parse_error() {
        let transport = Arc::new(RecordingTransport::new(
            "<html><body>blocked</body></html>".into(),
        ));
        let fetcher = ScrapingFetcher::new(transport, Arc::new(AgentCache::new()));
        let result = fetcher.fetch(&CancellationToken::new(), Category::Chrome).await;
        assert!(matches!(result, Err(MimicError::Parse(_))));
    }
}
