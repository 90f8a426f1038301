//! Canonical view identity and its hash key.

use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use super::FileFilter;
use super::FileSort;

/// The filters and sort that define one view over the corpus.
///
/// Filters are stored sorted and de-duplicated, so two identities built from
/// the same filters in a different order are equal and share a [`ViewKey`].
///
/// # Example
///
/// ```
/// use explorer_lib::query::{FileFilter, FileSort, ViewIdentity};
///
/// let a = ViewIdentity::new(
///     [FileFilter::new("Gene", "LMNB1"), FileFilter::new("Cell Line", "AICS-13")],
///     Some(FileSort::desc("uploaded")),
/// );
/// let b = ViewIdentity::new(
///     [FileFilter::new("Cell Line", "AICS-13"), FileFilter::new("Gene", "LMNB1")],
///     Some(FileSort::desc("uploaded")),
/// );
///
/// assert_eq!(a, b);
/// assert_eq!(a.key(), b.key());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawViewIdentity")]
pub struct ViewIdentity {
    filters: Vec<FileFilter>,
    sort: Option<FileSort>,
}

/// Wire form of an identity, canonicalized on conversion.
#[derive(Deserialize)]
struct RawViewIdentity {
    #[serde(default)]
    filters: Vec<FileFilter>,
    #[serde(default)]
    sort: Option<FileSort>,
}

impl From<RawViewIdentity> for ViewIdentity {
    fn from(raw: RawViewIdentity) -> Self {
        ViewIdentity::new(raw.filters, raw.sort)
    }
}

impl ViewIdentity {
    /// Creates an identity from filters in any order and an optional sort.
    pub fn new(filters: impl IntoIterator<Item = FileFilter>, sort: Option<FileSort>) -> Self {
        let mut filters: Vec<FileFilter> = filters.into_iter().collect();
        filters.sort();
        filters.dedup();
        Self { filters, sort }
    }

    /// Creates the identity of the unfiltered, unsorted corpus.
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns the filters in canonical order.
    pub fn filters(&self) -> &[FileFilter] {
        &self.filters
    }

    /// Returns the sort, if any.
    pub fn sort(&self) -> Option<&FileSort> {
        self.sort.as_ref()
    }

    /// Returns an identity with `filter` added.
    pub fn with_filter(&self, filter: FileFilter) -> Self {
        Self::new(self.filters.iter().cloned().chain([filter]), self.sort.clone())
    }

    /// Returns an identity with the sort replaced.
    pub fn with_sort(&self, sort: Option<FileSort>) -> Self {
        Self {
            filters: self.filters.clone(),
            sort,
        }
    }

    /// Derives the deterministic hash key of this identity.
    ///
    /// Each string is length-prefixed before hashing, so no two distinct
    /// identities share an encoding.
    pub fn key(&self) -> ViewKey {
        let mut hasher = Sha256::new();
        hasher.update((self.filters.len() as u64).to_le_bytes());
        for filter in &self.filters {
            update_str(&mut hasher, filter.name());
            update_str(&mut hasher, filter.value());
        }
        match &self.sort {
            Some(sort) => {
                hasher.update([1u8]);
                update_str(&mut hasher, sort.column());
                update_str(&mut hasher, sort.direction().as_str());
            }
            None => hasher.update([0u8]),
        }

        ViewKey(URL_SAFE_NO_PAD.encode(hasher.finalize()).into())
    }
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

/// Hash key of a [`ViewIdentity`].
///
/// Used wherever a view serves as a map key: selection storage, the view
/// registry and page fetch de-duplication. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewKey(Arc<str>);

impl ViewKey {
    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
