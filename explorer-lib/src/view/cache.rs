//! Per-view record cache

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::future::Shared;
use tokio::sync::OnceCell;

use crate::error::SourceError;
use crate::model::FileRecord;

/// An in-flight page fetch that any number of callers can await.
pub(crate) type PageFetch = Shared<BoxFuture<'static, Result<(), SourceError>>>;

/// An in-flight count request that any number of callers can await.
pub(crate) type CountFetch = Shared<BoxFuture<'static, Result<usize, SourceError>>>;

/// The mutable state behind a view: cached rows, the memoized total count
/// and the page fetches currently in flight.
///
/// Entries are never invalidated; the cache lives exactly as long as its view.
pub(crate) struct ViewCache {
    records: DashMap<usize, Arc<FileRecord>>,
    pub(crate) total: OnceCell<usize>,
    pub(crate) pending: DashMap<usize, PageFetch>,
    counting: Mutex<Option<CountFetch>>,
    /// First index known to lie past the end of the view, or `usize::MAX`.
    end: AtomicUsize,
}

impl ViewCache {
    pub(crate) fn new() -> Self {
        Self {
            records: DashMap::new(),
            total: OnceCell::new(),
            pending: DashMap::new(),
            counting: Mutex::new(None),
            end: AtomicUsize::new(usize::MAX),
        }
    }

    pub(crate) fn get(&self, index: usize) -> Option<Arc<FileRecord>> {
        self.records.get(&index).map(|entry| Arc::clone(entry.value()))
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        self.records.contains_key(&index)
    }

    /// Stores a whole page. Called only once the fetch fully succeeded.
    pub(crate) fn insert_page(&self, page_start: usize, records: Vec<FileRecord>) {
        for (offset, record) in records.into_iter().enumerate() {
            self.records.insert(page_start + offset, Arc::new(record));
        }
    }

    /// Records that the view holds no rows at or after `end`.
    pub(crate) fn mark_end(&self, end: usize) {
        self.end.fetch_min(end, Ordering::AcqRel);
    }

    pub(crate) fn is_past_end(&self, index: usize) -> bool {
        index >= self.end.load(Ordering::Acquire)
    }

    /// Locks the slot holding the in-flight count request, if any.
    pub(crate) fn counting(&self) -> MutexGuard<'_, Option<CountFetch>> {
        self.counting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

impl fmt::Debug for ViewCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewCache")
            .field("records", &self.records.len())
            .field("total", &self.total.get())
            .field("pending", &self.pending.len())
            .field("counting", &self.counting().is_some())
            .finish()
    }
}
