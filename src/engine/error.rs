//! Dante Error Types

use thiserror::Error;

use super::config::ConfigError;

#[derive(Error, Debug)]
pub enum DanteError {
    #[error("SQLite error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Stored document does not match {type_name}: {source}")]
    SchemaMismatch {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Document must encode to a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("{operation} is not supported on typed collection {collection}")]
    Unsupported {
        operation: &'static str,
        collection: String,
    },

    #[error("Connection was opened on another thread")]
    ThreadAffinity,

    #[error("Connection is closed")]
    Closed,

    #[error("Invalid field path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("Invalid collection name {name:?}: {reason}")]
    InvalidCollectionName { name: String, reason: &'static str },

    #[error("You must provide a filter to {0}")]
    MissingCriteria(&'static str),

    #[error("You must provide fields to set")]
    MissingFields,

    #[error("No database registered for {0}")]
    NotRegistered(&'static str),

    #[error("Async driver error: {0}")]
    Driver(String),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl From<tokio_rusqlite::Error> for DanteError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => DanteError::Storage(e),
            tokio_rusqlite::Error::ConnectionClosed => DanteError::Closed,
            tokio_rusqlite::Error::Close((_, e)) => DanteError::Storage(e),
            other => DanteError::Driver(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DanteError>;
