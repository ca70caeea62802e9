//! Error types.
//!
//! Store-level errors propagate out of the lifecycle triggers. Sender and
//! attachment errors are captured as data by the dispatch engine and never
//! cross a component boundary as `Err`.

use std::path::PathBuf;

use thiserror::Error;

use crate::report::ReportId;

/// Durable persistence failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("report record {id} is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("report {0} already exists")]
    AlreadyExists(ReportId),

    #[error("report {0} not found")]
    NotFound(ReportId),

    #[error("failed to serialize report {id}: {source}")]
    Serialize {
        id: ReportId,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Not-found is benign: usually a race with a concurrent delete.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure reported by a sender. The variant decides retry eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SenderError {
    /// Network, timeout, server busy.
    #[error("recoverable delivery failure: {0}")]
    Recoverable(String),

    /// Payload rejected or credentials permanently invalid.
    #[error("unrecoverable delivery failure: {0}")]
    Unrecoverable(String),
}

impl SenderError {
    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        Self::Recoverable(format!("{:#}", err.into()))
    }

    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self::Unrecoverable(format!("{:#}", err.into()))
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable(_))
    }
}

/// Failure to turn one attachment reference into bytes.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("unsupported attachment uri {uri}: {reason}")]
    UnsupportedUri { uri: String, reason: String },

    #[error("attachment {uri} unreadable: {source}")]
    Unreadable {
        uri: String,
        #[source]
        source: std::io::Error,
    },

    #[error("attachment provider failed: {0}")]
    Provider(String),
}

/// Configuration parse/validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by the lifecycle triggers.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no report sender is enabled")]
    NoSenders,
}

pub type CoreResult<T> = Result<T, CoreError>;
