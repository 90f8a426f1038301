//! In-memory record source

use std::collections::BTreeMap;
use std::collections::HashMap;

use async_trait::async_trait;

use super::AggregateInfo;
use super::RecordSource;
use crate::error::RecordError;
use crate::error::SourceError;
use crate::model::FileRecord;
use crate::query::FileFilter;
use crate::query::ViewIdentity;
use crate::selection::CompactSelection;

/// A record source over a corpus held in memory.
///
/// Filters sharing a name are alternatives (any may match); filters with
/// different names must all match. Sorting is stable, so unsorted views keep
/// corpus order.
///
/// # Example
///
/// ```
/// use explorer_lib::model::FileRecord;
/// use explorer_lib::source::InMemorySource;
///
/// let source = InMemorySource::new(vec![
///     FileRecord::new("1", "/data/a.tiff"),
///     FileRecord::new("2", "/data/b.tiff"),
/// ]);
/// assert_eq!(source.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<FileRecord>,
}

impl InMemorySource {
    /// Creates a source over the given records.
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self { records }
    }

    /// Creates a source from raw string rows, converting each with
    /// [`FileRecord::from_row`].
    pub fn from_rows(
        rows: impl IntoIterator<Item = HashMap<String, String>>,
    ) -> Result<Self, RecordError> {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(row_number, row)| FileRecord::from_row(&row, row_number))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { records })
    }

    /// Returns the number of records in the corpus.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the corpus is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the records matching `identity`, in view order.
    pub fn matching(&self, identity: &ViewIdentity) -> Vec<&FileRecord> {
        let mut by_name: BTreeMap<&str, Vec<&FileFilter>> = BTreeMap::new();
        for filter in identity.filters() {
            by_name.entry(filter.name()).or_default().push(filter);
        }

        let mut matching: Vec<&FileRecord> = self
            .records
            .iter()
            .filter(|record| {
                by_name
                    .values()
                    .all(|alternatives| alternatives.iter().any(|f| f.matches(record)))
            })
            .collect();

        if let Some(sort) = identity.sort() {
            matching.sort_by(|a, b| sort.compare(a, b));
        }
        matching
    }
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn count(&self, identity: &ViewIdentity) -> Result<usize, SourceError> {
        Ok(self.matching(identity).len())
    }

    async fn fetch(
        &self,
        identity: &ViewIdentity,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<FileRecord>, SourceError> {
        Ok(self
            .matching(identity)
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn aggregate(
        &self,
        selection: &[CompactSelection],
    ) -> Result<Option<AggregateInfo>, SourceError> {
        let mut selected: Vec<&FileRecord> = Vec::new();
        for part in selection {
            let matching = self.matching(&part.identity());
            for range in &part.ranges {
                selected.extend(range.iter().map_while(|index| matching.get(index).copied()));
            }
        }

        Ok(Some(AggregateInfo::from_records(selected)))
    }
}
