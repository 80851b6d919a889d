//! Crate-wide error type
//!
//! Most store operations degrade instead of failing (see the module docs in
//! `store`); the error type covers the paths that do surface to the caller,
//! chiefly unreadable files and rejected identifiers.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in ledger operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed json at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("gateway request failed: {0}")]
    Gateway(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.into(),
            source,
        }
    }
}
