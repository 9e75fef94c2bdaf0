//! Error types shared by the parsers, states, and the affinity resolver.

use std::path::PathBuf;

/// Failures raised while reading or parsing kernel text interfaces.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl ProcError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProcError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ProcError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for malformed content, false for access failures.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, ProcError::Parse { .. })
    }
}

/// Failures raised while resolving or applying affinity directives.
///
/// Callers treat every variant as a request-level placement failure.
#[derive(Debug, thiserror::Error)]
pub enum AffinityError {
    #[error("Affinity failed: {0}")]
    Failed(String),

    #[error("Affinity failed: {message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl AffinityError {
    pub fn failed(message: impl Into<String>) -> Self {
        AffinityError::Failed(message.into())
    }

    /// Human readable explanation naming the directive and target.
    pub fn explanation(&self) -> String {
        match self {
            AffinityError::Failed(msg) => msg.clone(),
            AffinityError::Io { message, source } => format!("{}: {}", message, source),
        }
    }
}

/// Malformed or unmatched NIC capacity requests.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum NicAllocationError {
    #[error("Invalid NIC allocation {identifier}: {message}")]
    Invalid { identifier: String, message: String },

    #[error("NIC allocation {0} already exists")]
    Duplicate(String),

    #[error("No NIC allocation with identifier {0}")]
    Unknown(String),
}

pub type ProcResult<T> = Result<T, ProcError>;
pub type AffinityResult<T> = Result<T, AffinityError>;
pub type NicAllocationResult<T> = Result<T, NicAllocationError>;
