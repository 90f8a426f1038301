//! Lazily paged views over the corpus.
//!
//! A [`View`] is one filtered and sorted projection of the remote corpus. It
//! never holds the whole projection: rows are fetched a page at a time, the
//! first time something asks for them, and kept until the view is dropped.
//!
//! Views are obtained from a [`ViewRegistry`], which hands out one live view
//! per [`ViewKey`] so every consumer of the same identity shares one cache.
//!
//! # Example
//!
//! ```ignore
//! let registry = ViewRegistry::new(source)?;
//! let view = registry.view(ViewIdentity::all());
//!
//! match view.record_at(1000) {
//!     RecordState::Ready(record) => println!("{}", record.file_name),
//!     RecordState::Pending => { /* draw a placeholder, re-poll on ViewEvent */ }
//!     RecordState::OutOfRange => {}
//! }
//! ```

mod cache;
mod config;
mod generation;
mod limit;
mod registry;

pub use config::*;
pub use generation::*;
pub use limit::*;
pub use registry::*;

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;
use std::sync::Weak;

use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future;
use futures::future::BoxFuture;
use log::debug;
use log::trace;
use log::warn;
use tokio::runtime::Handle;
use tokio::sync::broadcast;

use cache::CountFetch;
use cache::PageFetch;
use cache::ViewCache;

use crate::error::Error;
use crate::error::SourceError;
use crate::interval::Interval;
use crate::model::FileRecord;
use crate::query::ViewIdentity;
use crate::query::ViewKey;
use crate::source::RecordSource;

/// Result of a synchronous row read.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordState {
    /// The row is cached.
    Ready(Arc<FileRecord>),
    /// The row's page is being fetched; read again after the next
    /// [`ViewEvent`].
    Pending,
    /// The view is known to end before this row.
    OutOfRange,
}

impl RecordState {
    /// Returns the record if it is ready.
    pub fn record(&self) -> Option<&FileRecord> {
        match self {
            RecordState::Ready(record) => Some(record),
            _ => None,
        }
    }

    /// Returns `true` if the row is still loading.
    pub fn is_pending(&self) -> bool {
        matches!(self, RecordState::Pending)
    }
}

/// Notification sent when a background page fetch settles.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    /// Rows `page_start..page_start + len` are now cached.
    PageLoaded { page_start: usize, len: usize },
    /// The page starting at `page_start` could not be fetched. Nothing was
    /// cached; reading any of its rows again retries.
    PageFailed { page_start: usize, error: SourceError },
}

/// A filtered, sorted, lazily paged projection of the corpus.
///
/// Cheap to clone; clones share the same cache. Two views are equal when
/// their keys are equal.
#[derive(Clone)]
pub struct View {
    inner: Arc<ViewInner>,
}

pub(crate) struct ViewInner {
    identity: ViewIdentity,
    key: ViewKey,
    source: Arc<dyn RecordSource>,
    cache: Arc<ViewCache>,
    page_size: usize,
    limiter: FetchLimiter,
    runtime: Handle,
    events: broadcast::Sender<ViewEvent>,
}

impl View {
    pub(crate) fn new(
        identity: ViewIdentity,
        source: Arc<dyn RecordSource>,
        config: &ViewConfig,
        limiter: FetchLimiter,
        runtime: Handle,
    ) -> Self {
        let key = identity.key();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        debug!("Opening view {}", key);

        Self {
            inner: Arc::new(ViewInner {
                identity,
                key,
                source,
                cache: Arc::new(ViewCache::new()),
                page_size: config.page_size.max(1),
                limiter,
                runtime,
                events,
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> Weak<ViewInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(weak: &Weak<ViewInner>) -> Option<View> {
        weak.upgrade().map(|inner| View { inner })
    }

    /// Returns the filters and sort of this view.
    pub fn identity(&self) -> &ViewIdentity {
        &self.inner.identity
    }

    /// Returns the identity hash key.
    pub fn key(&self) -> &ViewKey {
        &self.inner.key
    }

    /// Returns `true` if both views have the same identity.
    pub fn equals(&self, other: &View) -> bool {
        self.inner.key == other.inner.key
    }

    /// Returns the number of rows per page fetch.
    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    /// Returns the first index of the page containing `index`.
    pub fn page_start(&self, index: usize) -> usize {
        (index / self.inner.page_size) * self.inner.page_size
    }

    /// Returns the number of cached rows.
    pub fn cached_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Returns the total count if it has already been fetched.
    pub fn cached_total_count(&self) -> Option<usize> {
        self.inner.cache.total.get().copied()
    }

    /// Subscribes to page load notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.inner.events.subscribe()
    }

    /// Returns the number of rows in the view.
    ///
    /// The count is fetched once and memoized. Concurrent callers share the
    /// in-flight request and its outcome; a failed request is not memoized.
    pub async fn total_count(&self) -> Result<usize, Error> {
        if let Some(count) = self.cached_total_count() {
            return Ok(count);
        }
        Ok(self.count_fetch().await?)
    }

    /// Reads one row without waiting.
    ///
    /// A row that is not cached yet starts (or joins) the fetch of its page
    /// and reads as [`RecordState::Pending`].
    pub fn record_at(&self, index: usize) -> RecordState {
        if let Some(record) = self.inner.cache.get(index) {
            trace!("Cache hit for row {} of view {}", index, self.inner.key);
            return RecordState::Ready(record);
        }
        if self.inner.cache.is_past_end(index) {
            return RecordState::OutOfRange;
        }

        let _ = self.page_fetch(self.page_start(index));
        RecordState::Pending
    }

    /// Waits until the page containing `index` is cached.
    pub async fn load_page(&self, index: usize) -> Result<(), Error> {
        if self.inner.cache.contains(index) || self.inner.cache.is_past_end(index) {
            return Ok(());
        }
        self.page_fetch(self.page_start(index)).await?;
        Ok(())
    }

    /// Resolves the records of every index covered by `ranges`, in index order.
    ///
    /// Ranges are first clamped to the view's total count. Only pages holding
    /// uncached rows are fetched.
    pub async fn records_for(&self, ranges: &[Interval]) -> Result<Vec<Arc<FileRecord>>, Error> {
        let total = self.total_count().await?;
        let Some(last) = total.checked_sub(1) else {
            return Ok(Vec::new());
        };
        let bounds = Interval::spanning(0, last);
        let ranges = Interval::compact(ranges.iter().filter_map(|range| range.intersection(&bounds)));
        let cache = &self.inner.cache;

        let missing_pages: BTreeSet<usize> = ranges
            .iter()
            .flat_map(|range| range.iter())
            .filter(|&index| !cache.contains(index))
            .map(|index| self.page_start(index))
            .collect();

        if !missing_pages.is_empty() {
            debug!(
                "Fetching {} page(s) of view {} for {} range(s)",
                missing_pages.len(),
                self.inner.key,
                ranges.len()
            );
            future::try_join_all(missing_pages.into_iter().map(|page| self.page_fetch(page))).await?;
        }

        let mut records = Vec::new();
        for range in &ranges {
            for index in range.iter() {
                match cache.get(index) {
                    Some(record) => records.push(record),
                    None if cache.is_past_end(index) => break,
                    None => debug!("Row {} of view {} missing from its page", index, self.inner.key),
                }
            }
        }
        Ok(records)
    }

    /// Returns the in-flight count request, starting one if needed.
    fn count_fetch(&self) -> CountFetch {
        let mut counting = self.inner.cache.counting();
        if let Some(fetch) = counting.as_ref() {
            return fetch.clone();
        }
        if let Some(&count) = self.inner.cache.total.get() {
            return future::ready(Ok(count)).boxed().shared();
        }

        let fetch = self.fetch_count().shared();
        *counting = Some(fetch.clone());
        drop(counting);

        self.inner.runtime.spawn(fetch.clone());
        fetch
    }

    fn fetch_count(&self) -> BoxFuture<'static, Result<usize, SourceError>> {
        let source = Arc::clone(&self.inner.source);
        let identity = self.inner.identity.clone();
        let key = self.inner.key.clone();
        let cache = Arc::clone(&self.inner.cache);
        let limiter = self.inner.limiter.clone();

        async move {
            let result: Result<usize, SourceError> = async {
                let _permit = limiter.acquire().await?;
                debug!("Counting rows of view {}", key);
                source.count(&identity).await
            }
            .await;

            match &result {
                Ok(count) => {
                    let _ = cache.total.set(*count);
                    cache.mark_end(*count);
                }
                Err(error) => warn!("Failed to count rows of view {}: {}", key, error),
            }
            *cache.counting() = None;
            result
        }
        .boxed()
    }

    /// Returns the in-flight fetch of a page, starting one if needed.
    fn page_fetch(&self, page_start: usize) -> PageFetch {
        let fetch = match self.inner.cache.pending.entry(page_start) {
            Entry::Occupied(entry) => return entry.get().clone(),
            Entry::Vacant(entry) => {
                let fetch = self.fetch_page(page_start).shared();
                entry.insert(fetch.clone());
                fetch
            }
        };

        // Driven in the background so a dropped awaiter never stalls the page.
        self.inner.runtime.spawn(fetch.clone());
        fetch
    }

    fn fetch_page(&self, page_start: usize) -> BoxFuture<'static, Result<(), SourceError>> {
        let source = Arc::clone(&self.inner.source);
        let identity = self.inner.identity.clone();
        let key = self.inner.key.clone();
        let cache = Arc::clone(&self.inner.cache);
        let limiter = self.inner.limiter.clone();
        let events = self.inner.events.clone();
        let page_size = self.inner.page_size;

        async move {
            let result: Result<Vec<FileRecord>, SourceError> = async {
                let _permit = limiter.acquire().await?;
                debug!("Fetching rows {}..{} of view {}", page_start, page_start + page_size, key);
                source.fetch(&identity, page_start, page_size).await
            }
            .await;

            match result {
                Ok(mut records) => {
                    records.truncate(page_size);
                    let len = records.len();
                    cache.insert_page(page_start, records);
                    if len < page_size {
                        cache.mark_end(page_start + len);
                    }
                    cache.pending.remove(&page_start);

                    debug!("Loaded {} row(s) at {} of view {}", len, page_start, key);
                    let _ = events.send(ViewEvent::PageLoaded { page_start, len });
                    Ok(())
                }
                Err(error) => {
                    cache.pending.remove(&page_start);

                    warn!("Failed to fetch rows at {} of view {}: {}", page_start, key, error);
                    let _ = events.send(ViewEvent::PageFailed {
                        page_start,
                        error: error.clone(),
                    });
                    Err(error)
                }
            }
        }
        .boxed()
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for View {}

impl Hash for View {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.key.hash(state);
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("key", &self.inner.key)
            .field("identity", &self.inner.identity)
            .field("cache", &self.inner.cache)
            .finish()
    }
}
