//! Error types for storage, import/export and configuration
//!
//! None of these escape a `DiagramSession`; the session turns them into
//! status messages. The CLI surfaces them through `anyhow`.

use atlas_graph::InvalidLayout;
use std::path::PathBuf;
use thiserror::Error;

/// Device-local layout storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on layout {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize layout: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("storage quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("layout storage unavailable: {0}")]
    Unavailable(String),
}

/// A layout file the user tried to import was not accepted
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid layout file: {0}")]
    Invalid(#[from] InvalidLayout),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writing an export file failed
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize layout: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid environment configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}
