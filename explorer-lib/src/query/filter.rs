//! Filter predicate for views.

use serde::Deserialize;
use serde::Serialize;

use crate::model::FileRecord;

/// A predicate restricting a view to records whose field or annotation
/// `name` holds `value`.
///
/// Filters order by name, then value; a [`ViewIdentity`](super::ViewIdentity)
/// stores them in that order so that filter sets built in different orders
/// compare equal.
///
/// # Example
///
/// ```
/// use explorer_lib::query::FileFilter;
///
/// let filter = FileFilter::new("Cell Line", "AICS-11");
/// assert_eq!(filter.name(), "Cell Line");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileFilter {
    name: String,
    value: String,
}

impl FileFilter {
    /// Creates a filter `name = value`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the filtered field or annotation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the required value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` if the record holds the filter's value under its name.
    pub fn matches(&self, record: &FileRecord) -> bool {
        record.values_of(&self.name).iter().any(|v| v == &self.value)
    }
}
