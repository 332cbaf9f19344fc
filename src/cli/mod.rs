pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mimic")]
#[command(about = "Serve realistic browser user agents from a refreshable cache", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/mimic/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print one random user agent
    Random {
        /// Only agents containing this OS marker (e.g. "linux")
        #[arg(long, default_value = "")]
        os: String,

        /// Only agents containing this browser marker (e.g. "firefox")
        #[arg(long, default_value = "")]
        browser: String,
    },
    /// Print every cached user agent
    List,
    /// Show cache size and freshness
    Status,
    /// Refresh the cache now
    Refresh {
        /// Refresh even if the cache is still fresh
        #[arg(short, long)]
        force: bool,
    },
    /// Keep the cache refreshed in the foreground until interrupted
    Daemon {
        /// Refresh interval (e.g., "24h", "30m", "1d"); defaults to the config value
        #[arg(short, long)]
        interval: Option<String>,

        /// Skip the startup refresh
        #[arg(long)]
        no_initial_update: bool,

        /// Log file path (default: stderr)
        #[arg(short, long)]
        log: Option<std::path::PathBuf>,
    },
}
