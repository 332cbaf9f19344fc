//! Background refresh loop.
//!
//! Refreshes once at startup (unless the cached list is still fresh), then
//! forces a refresh on every tick. Between refreshes it can re-read the store
//! so a list written by another process is picked up. Errors are logged and
//! the loop carries on serving the last good snapshot.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::app::MimicError;
use crate::refresh::{RefreshCoordinator, RefreshOutcome};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// How often the store is checked for a snapshot written elsewhere.
pub const DEFAULT_RELOAD_INTERVAL: Duration = Duration::from_secs(60);

const UNITS: [(&str, u64); 4] = [("d", 86400), ("h", 3600), ("m", 60), ("s", 1)];

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Time between forced refreshes (default: 24h)
    pub interval: Duration,
    /// Whether to run an unforced refresh immediately on start
    pub refresh_on_start: bool,
    /// Time between store re-reads; `None` disables them
    pub reload_interval: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            refresh_on_start: true,
            reload_interval: Some(DEFAULT_RELOAD_INTERVAL),
        }
    }
}

/// Parse an interval such as "24h", "30m", "1d", "90s" or bare seconds.
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    let invalid = || format!("Invalid interval: {}. Use format like '24h', '30m', '1d'", s);

    let multiplier = match unit {
        "" => 1,
        unit => UNITS
            .iter()
            .find(|(suffix, _)| *suffix == unit)
            .map(|(_, secs)| *secs)
            .ok_or_else(invalid)?,
    };
    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let secs = value
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Interval too large: {}", s))?;

    if secs == 0 {
        return Err("Interval must be greater than zero".to_string());
    }
    Ok(Duration::from_secs(secs))
}

/// Largest whole unit that divides the interval, e.g. "1d", "90s", "250ms".
pub fn format_interval(interval: Duration) -> String {
    let secs = interval.as_secs();
    if secs == 0 {
        return format!("{}ms", interval.as_millis());
    }
    UNITS
        .iter()
        .find(|(_, size)| secs.is_multiple_of(*size))
        .map(|(suffix, size)| format!("{}{}", secs / size, suffix))
        .unwrap_or_else(|| format!("{}s", secs))
}

pub struct Scheduler {
    coordinator: Arc<RefreshCoordinator>,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(coordinator: Arc<RefreshCoordinator>, config: SchedulerConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Start the loop on the current runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone()));
        SchedulerHandle { cancel, task }
    }

    async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            "User agent scheduler started (refresh interval: {})",
            format_interval(self.config.interval)
        );

        if self.config.refresh_on_start {
            self.run_refresh(false, &cancel).await;
        }

        let mut timer = interval(self.config.interval.max(Duration::from_millis(1)));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await; // Skip the first immediate tick

        let reload_every = self.config.reload_interval;
        let reload_period = reload_every.unwrap_or(DEFAULT_RELOAD_INTERVAL);
        let mut reload_timer = interval(reload_period.max(Duration::from_millis(1)));
        reload_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        reload_timer.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = timer.tick() => self.run_refresh(true, &cancel).await,
                _ = reload_timer.tick(), if reload_every.is_some() => self.run_reload(),
            }
        }

        tracing::info!("User agent scheduler stopped");
    }

    fn run_reload(&self) {
        match self.coordinator.reload() {
            Ok(true) => tracing::info!("Reloaded user agents written by another process"),
            Ok(false) => {}
            Err(e) => tracing::warn!("Failed to re-read stored user agents: {}", e),
        }
    }

    async fn run_refresh(&self, force: bool, cancel: &CancellationToken) {
        let start = Instant::now();

        match self.coordinator.refresh_with_cancel(force, cancel).await {
            Ok(RefreshOutcome::Skipped) => {
                tracing::info!("User agents are fresh, nothing to do");
            }
            Ok(RefreshOutcome::Refreshed { agents, failed }) => {
                tracing::info!(
                    "Refresh complete: {} user agents, {} failed categories ({:.1}s)",
                    agents,
                    failed.len(),
                    start.elapsed().as_secs_f64()
                );
            }
            Err(MimicError::Cancelled) if cancel.is_cancelled() => {
                tracing::debug!("Refresh cancelled by shutdown");
            }
            Err(e) => {
                tracing::error!("Scheduled user agent refresh failed: {}", e);
            }
        }
    }
}

/// Owns the running loop; dropping it leaves the loop running.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop, cancelling a refresh in progress, and wait for it.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::error!("Scheduler task join error: {}", e);
        }
    }
}
