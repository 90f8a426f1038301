//! Record sources
//!
//! A [`RecordSource`] is the remote service a [`View`](crate::view::View)
//! pages through. The crate ships [`InMemorySource`] for local corpora and
//! tests; network-backed sources implement the same trait.

mod memory;

pub use memory::*;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::error::SourceError;
use crate::model::FileRecord;
use crate::query::ViewIdentity;
use crate::selection::CompactSelection;

/// Summary of a whole selection, computed without enumerating it client side
/// when the source supports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateInfo {
    /// Number of selected rows across all views.
    pub count: usize,
    /// Number of distinct files among the selected rows.
    pub unique_count: usize,
    /// Total size in bytes, when the source knows file sizes.
    pub size: Option<u64>,
}

impl AggregateInfo {
    /// Summarizes records client side.
    ///
    /// The size is only reported when the first record carries one; records
    /// without a size then count as zero.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a FileRecord>) -> Self {
        let mut count = 0;
        let mut unique: HashSet<&str> = HashSet::new();
        let mut size: Option<u64> = None;

        for record in records {
            if count == 0 {
                size = record.file_size.map(|_| 0);
            }
            count += 1;
            unique.insert(record.file_id.as_str());
            if let Some(total) = size.as_mut() {
                *total += record.file_size.unwrap_or(0);
            }
        }

        Self {
            count,
            unique_count: unique.len(),
            size,
        }
    }
}

/// Trait for the paging and counting service behind views.
///
/// Implementations must return rows in the order defined by the identity's
/// sort, so that the same `(identity, offset)` always names the same row.
///
/// # Example
///
/// ```ignore
/// use explorer_lib::source::RecordSource;
///
/// let total = source.count(&identity).await?;
/// let first_page = source.fetch(&identity, 0, 100).await?;
/// ```
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Returns the number of records matching the identity's filters.
    async fn count(&self, identity: &ViewIdentity) -> Result<usize, SourceError>;

    /// Returns up to `limit` records starting at row `offset`.
    ///
    /// Fewer than `limit` records means the end of the view was reached.
    async fn fetch(
        &self,
        identity: &ViewIdentity,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FileRecord>, SourceError>;

    /// Aggregates a whole selection on the source side.
    ///
    /// Returns `Ok(None)` when the source cannot aggregate; callers then
    /// fall back to fetching the selected records.
    async fn aggregate(
        &self,
        _selection: &[CompactSelection],
    ) -> Result<Option<AggregateInfo>, SourceError> {
        Ok(None)
    }
}
