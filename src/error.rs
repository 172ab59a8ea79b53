//! Error handling for the erebus scanner
//!
//! Fatal errors (configuration, baseline, registry) abort the run before any
//! probe is dispatched. Per-candidate probe errors never surface here as
//! fatal: the probe downgrades them to a no-match outcome.

use thiserror::Error;

/// Main error type for scanning operations
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Baseline capture failed: {0}")]
    Baseline(String),

    #[error("Range registry error: {0}")]
    Registry(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for scan operations
pub type Result<T> = std::result::Result<T, ScanError>;
