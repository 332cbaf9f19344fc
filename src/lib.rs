//! # mimic
//!
//! A refreshable pool of real-world browser user-agent strings.
//!
//! ## Architecture
//!
//! ```text
//! Scheduler → RefreshCoordinator → Fetcher (per browser) → AgentCache → SnapshotStore
//! ```
//!
//! - [`scheduler`]: background loop, refreshes at startup and every interval
//! - [`refresh`]: concurrent fan-out over browser categories, merge and commit
//! - [`fetcher`]: reference page retrieval and user-agent extraction
//! - [`cache`]: shared snapshot read by any number of callers
//! - [`store`]: JSON file persistence between runs
//!
//! ## Quick Start
//!
//! ```bash
//! # Print a random user agent
//! mimic random
//!
//! # Only Firefox on Linux
//! mimic random --os linux --browser firefox
//!
//! # Refresh now, ignoring the freshness window
//! mimic refresh --force
//!
//! # Keep the list refreshed in the foreground
//! mimic daemon --interval 24h
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the cache,
/// store, fetcher and refresh coordinator, and exposes the query surface.
pub mod app;

/// Shared in-memory cache of user agents.
///
/// - [`AgentCache`](cache::AgentCache): random, filtered and full-list reads
/// - [`DEFAULT_USER_AGENT`](cache::DEFAULT_USER_AGENT): fallback for empty reads
pub mod cache;

/// Command-line interface using clap.
///
/// - `random [--os] [--browser]` - Print one user agent
/// - `list` - Print all cached user agents
/// - `status` - Cache size and freshness
/// - `refresh [--force]` - Refresh synchronously
/// - `daemon` - Run the scheduler until interrupted
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/mimic/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Category`](domain::Category): browser family scraped as one unit
/// - [`Snapshot`](domain::Snapshot): one consistent version of the list
pub mod domain;

/// Reference page fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait, one category per call
/// - [`Transport`](fetcher::Transport): Async trait for the HTTP retrieval
/// - [`ScrapingFetcher`](fetcher::ScrapingFetcher): extracts and filters agents
/// - [`HttpTransport`](fetcher::HttpTransport): reqwest-based implementation
pub mod fetcher;

/// Case-insensitive recognition of desktop user agents.
pub mod matcher;

/// Refresh cycles over all browser categories.
pub mod refresh;

/// Background refresh loop.
pub mod scheduler;

/// Snapshot persistence.
///
/// - [`SnapshotStore`](store::SnapshotStore): Trait with `load`/`save`
/// - [`JsonFileStore`](store::JsonFileStore): JSON file implementation
/// - [`MemoryStore`](store::MemoryStore): in-process implementation
pub mod store;

#[cfg(test)]
mod testing;
