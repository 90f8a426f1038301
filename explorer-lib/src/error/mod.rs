//! Error types

mod interval;
mod record;
mod source;

pub use interval::*;
pub use record::*;
pub use source::*;

/// Top-level error returned by view reads and selection aggregation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The record source failed to answer a request.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A view registry was built outside of a tokio runtime and no handle was given.
    #[error("No tokio runtime available to drive background page fetches")]
    NoRuntime,
}

impl Error {
    /// Returns the source error, if this error came from the record source.
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            Self::Source(err) => Some(err),
            _ => None,
        }
    }
}
