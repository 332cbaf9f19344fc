use crate::app::{AppContext, Result};
use crate::refresh::RefreshOutcome;
use crate::scheduler::{format_interval, SchedulerConfig};

pub fn random_agent(ctx: &AppContext, os: &str, browser: &str) {
    let agent = if os.is_empty() && browser.is_empty() {
        ctx.random_agent()
    } else {
        ctx.random_agent_filtered(os, browser)
    };
    println!("{}", agent);
}

pub fn list_agents(ctx: &AppContext) {
    let agents = ctx.all_agents();
    if agents.is_empty() {
        println!("No user agents cached. Run `mimic refresh` first.");
        return;
    }
    for agent in agents {
        println!("{}", agent);
    }
}

pub fn status(ctx: &AppContext) {
    println!("Cached user agents: {}", ctx.count());
    match ctx.cache.last_update() {
        Some(ts) => println!(
            "Last update: {}",
            ts.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("Last update: never"),
    }
    println!(
        "Fresh: {} (window: {})",
        if ctx.is_fresh() { "yes" } else { "no" },
        format_interval(ctx.cache.freshness_window())
    );
}

pub async fn refresh(ctx: &AppContext, force: bool) -> Result<()> {
    match ctx.refresh(force).await? {
        RefreshOutcome::Skipped => {
            println!(
                "User agents are fresh ({} cached). Use --force to refresh anyway.",
                ctx.count()
            );
        }
        RefreshOutcome::Refreshed { agents, failed } => {
            println!("Refreshed {} user agents", agents);
            if !failed.is_empty() {
                let names: Vec<String> = failed.iter().map(|c| c.to_string()).collect();
                println!("Failed categories: {}", names.join(", "));
            }
        }
    }
    Ok(())
}

pub async fn run_daemon(ctx: &AppContext, config: SchedulerConfig) -> Result<()> {
    tracing::info!(
        "mimic daemon started (interval: {}, PID: {})",
        format_interval(config.interval),
        std::process::id()
    );

    let handle = ctx.spawn_scheduler_with(config);
    wait_for_shutdown_signal().await;

    tracing::info!("Daemon shutting down...");
    handle.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
        }
        _ => {
            tracing::warn!("Failed to install signal handlers, falling back to Ctrl-C");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(windows)]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
