use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MimicError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),

    #[error("Fetch cancelled")]
    Cancelled,

    #[error("All {count} categories failed, last error: {source}")]
    AllCategoriesFailed {
        count: usize,
        #[source]
        source: Box<MimicError>,
    },

    #[error("Failed to persist user agents to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MimicError>;
