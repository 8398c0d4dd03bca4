//! Error handling for skinledger
//!
//! Defines the crate-level error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for loading settings and trade records
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("config error: {0}")]
    Config(String),

    #[error("input error: {0}")]
    Input(String),

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;
