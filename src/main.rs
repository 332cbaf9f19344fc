use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mimic::app::AppContext;
use mimic::cli::{commands, Cli, Commands};
use mimic::config::Config;
use mimic::scheduler::{parse_interval, SchedulerConfig};

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(filter)
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Daemon { log, .. } => log.as_deref(),
        _ => None,
    };
    init_tracing(log_file)?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(&config)?;

    match cli.command {
        Commands::Random { os, browser } => {
            if ctx.count() == 0 {
                // First use: populate the cache before answering.
                if let Err(e) = ctx.refresh(false).await {
                    tracing::warn!("Refresh failed, serving default user agent: {}", e);
                }
            }
            commands::random_agent(&ctx, &os, &browser);
        }
        Commands::List => {
            commands::list_agents(&ctx);
        }
        Commands::Status => {
            commands::status(&ctx);
        }
        Commands::Refresh { force } => {
            commands::refresh(&ctx, force).await?;
        }
        Commands::Daemon {
            interval,
            no_initial_update,
            log: _,
        } => {
            let interval = match interval {
                Some(s) => parse_interval(&s).map_err(anyhow::Error::msg)?,
                None => config.refresh.interval(),
            };
            let scheduler_config = SchedulerConfig {
                interval,
                refresh_on_start: config.refresh.refresh_on_start && !no_initial_update,
                reload_interval: config.refresh.reload_interval(),
            };
            commands::run_daemon(&ctx, scheduler_config).await?;
        }
    }

    Ok(())
}
