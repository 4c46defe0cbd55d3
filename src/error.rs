//! Error taxonomy for the import pipeline.
//!
//! Line- and file-level failures are contained by the walker (skip and
//! continue); `Config` and `StoreConnection` abort the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed line: {0}")]
    Extraction(String),

    #[error("failed to open store connection: {0}")]
    StoreConnection(#[source] sqlx::Error),

    #[error("store operation failed: {0}")]
    StoreOperation(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, ImportError>;
