//! Record source error types

use std::time::Duration;

/// Errors reported by a [`RecordSource`](crate::source::RecordSource).
///
/// Cloneable so that one in-flight page fetch can hand the same failure to
/// every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// The source could not be reached.
    #[error("Source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with an error status.
    #[error("Request rejected with status {status}: {message}")]
    Rejected {
        /// Status code reported by the source.
        status: u16,
        /// Error message.
        message: String,
    },

    /// The source answered but the payload could not be interpreted.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The request took too long.
    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The source does not implement the requested operation.
    #[error("Operation not supported by this source: {0}")]
    Unsupported(&'static str),
}

impl SourceError {
    /// Creates a new rejected request error.
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Returns the status code if the source rejected the request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if issuing the same read again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rejected { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Unavailable(_) => true,
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}
