//! Shared stubs for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::app::{MimicError, Result};
use crate::domain::Category;
use crate::fetcher::Fetcher;

/// Reference page with five desktop agents and two the default patterns reject.
pub(crate) fn reference_page() -> String {
    let agents = [
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        "Mozilla/5.0 (X11; Linux i686; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
        "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 Version/17.2 Mobile/15E148 Safari/604.1",
        "Mozilla/5.0 (Linux; Android 10; K) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36",
    ];
    let items: String = agents
        .iter()
        .map(|a| format!("<li><span class=\"code\">{}</span></li>", a))
        .collect();
    format!(
        "<html><body><table><tr><td><ul>{}</ul></td></tr></table></body></html>",
        items
    )
}

/// Scripted per-category responses.
#[derive(Clone)]
pub(crate) enum Reply {
    Agents(Vec<String>),
    Fail(String),
    /// Sleeps (observing the token) before answering with the agents.
    Slow(Duration, Vec<String>),
    /// The fetch task panics.
    Panic,
}

/// Fetcher stub that answers from a script and counts invocations.
pub(crate) struct StubFetcher {
    replies: HashMap<Category, Reply>,
    fallback: Reply,
    calls: AtomicUsize,
}

impl StubFetcher {
    /// Every category answers with the same agents.
    pub(crate) fn uniform<S: Into<String>>(agents: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: HashMap::new(),
            fallback: Reply::Agents(agents.into_iter().map(Into::into).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_fallback(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    pub(crate) fn with_reply(mut self, category: Category, reply: Reply) -> Self {
        self.replies.insert(category, reply);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        cancel: &CancellationToken,
        category: Category,
    ) -> Result<HashSet<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match self.replies.get(&category).unwrap_or(&self.fallback).clone() {
            Reply::Agents(agents) => Ok(agents.into_iter().collect()),
            Reply::Fail(reason) => Err(MimicError::Transport(reason)),
            Reply::Slow(delay, agents) => {
                tokio::select! {
                    _ = cancel.cancelled() => Err(MimicError::Cancelled),
                    _ = tokio::time::sleep(delay) => Ok(agents.into_iter().collect()),
                }
            }
            Reply::Panic => panic!("scripted fetch panic for {}", category),
        }
    }
}

pub(crate) fn agents(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("Mozilla/5.0 (X11; Linux x86_64) {}/{}", prefix, i))
        .collect()
}
