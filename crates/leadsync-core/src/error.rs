//! Error types for leadsync-core

use serde::Serialize;
use thiserror::Error;

/// Result type alias using leadsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// One lead the sync engine could not insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedInsert {
    /// Identity key of the lead that failed
    pub identity_key: String,
    /// Store error message
    pub message: String,
}

/// Errors that can occur in leadsync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Remote lead source failed (network, HTTP status or payload)
    #[error("Lead source unavailable: {message}")]
    SourceUnavailable {
        /// HTTP status when the source answered at all
        status: Option<u16>,
        message: String,
    },

    /// Local store read/write failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// One or more insertions failed after a successful fetch
    #[error("Sync partially failed: {succeeded} inserted, {} failed", failed.len())]
    PartialSyncFailure {
        succeeded: usize,
        failed: Vec<FailedInsert>,
    },

    /// Lead (or other record) not found in the account scope
    #[error("Not found: {0}")]
    NotFound(String),

    /// Insert rejected by the optional identity uniqueness constraint
    #[error("Lead already stored: {0}")]
    DuplicateIdentity(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Malformed CSV input
    #[error("CSV error on line {line}: {message}")]
    Csv { line: usize, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a source error without an HTTP status.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            status: None,
            message: message.into(),
        }
    }

    /// HTTP status reported by the lead source, if any.
    pub const fn source_status(&self) -> Option<u16> {
        match self {
            Self::SourceUnavailable { status, .. } => *status,
            _ => None,
        }
    }

    /// The sheet endpoint answers HTTP 500 when the account has no sheet yet.
    pub const fn is_missing_sheet(&self) -> bool {
        matches!(self.source_status(), Some(500))
    }
}

impl From<libsql::Error> for Error {
    fn from(error: libsql::Error) -> Self {
        Self::StoreUnavailable(error.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::SourceUnavailable {
            status: error.status().map(|status| status.as_u16()),
            message: error.to_string(),
        }
    }
}
