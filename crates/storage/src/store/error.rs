#![forbid(unsafe_code)]

use thiserror::Error;
use tl_core::PayloadError;

/// Error reported by the primary database while replaying history into it.
pub type PrimaryError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload: {0}")]
    Payload(#[from] PayloadError),
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("change index {index} out of range")]
    IndexOutOfRange { index: usize },
    #[error("unknown transaction {0}")]
    UnknownTransaction(i64),
    #[error("unknown connection {0}")]
    UnknownConnection(i64),
    #[error("primary database: {0}")]
    Primary(#[source] PrimaryError),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
            Self::Json(_) => "JSON",
            Self::Payload(_) => "PAYLOAD",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::UnknownTransaction(_) => "NOT_FOUND",
            Self::UnknownConnection(_) => "NOT_FOUND",
            Self::Primary(_) => "PRIMARY_DB",
        }
    }
}
