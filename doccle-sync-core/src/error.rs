//! Error types surfaced by the core crate.

use std::path::PathBuf;
use thiserror::Error;

/// Required configuration is missing or unusable. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// The single error kind of the ingestion client. Missing files, I/O
/// failures, transport errors and non-2xx responses all end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct IngestionError {
    pub message: String,
}

impl IngestionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NamingError {
    #[error("document has no {0}")]
    MissingField(&'static str),

    #[error("unparseable publish date {value:?}: {source}")]
    PublishDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise document record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Run-level failure. Per-document problems never produce this.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to prepare download directory {path}: {source}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
