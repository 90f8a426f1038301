//! Record conversion error types

/// Errors raised while converting a raw row into a [`FileRecord`](crate::model::FileRecord).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// A column every row must carry is absent.
    #[error("\"{column}\" is a required column for data sources")]
    MissingColumn { column: String },

    /// A column is present but its value cannot be interpreted.
    #[error("Column '{column}' has invalid value '{value}': {reason}")]
    InvalidValue {
        column: String,
        value: String,
        reason: String,
    },
}

impl RecordError {
    /// Creates a new missing column error.
    pub fn missing(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }

    /// Creates a new invalid value error.
    pub fn invalid(column: impl Into<String>, value: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidValue {
            column: column.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }
}
