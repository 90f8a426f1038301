//! Bounds on simultaneous record source requests.

use std::sync::Arc;

use log::trace;
use tokio::sync::OwnedSemaphorePermit;
use tokio::sync::Semaphore;

use crate::error::SourceError;

/// Caps how many count and page requests a registry has in flight.
///
/// Every view opened by one [`ViewRegistry`](super::ViewRegistry) draws from
/// the same pool, so scrolling through many views at once cannot flood the
/// source. Permits are owned, so a background page fetch can hold one for as
/// long as its request runs.
///
/// # Example
///
/// ```
/// use explorer_lib::view::FetchLimiter;
///
/// let limiter = FetchLimiter::new(4);
/// assert_eq!(limiter.limit(), 4);
/// assert_eq!(limiter.in_flight(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct FetchLimiter {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl FetchLimiter {
    /// Creates a limiter allowing `limit` requests at once. Zero is raised to one.
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Waits for a free slot. The slot is released when the permit drops.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, SourceError> {
        if self.permits.available_permits() == 0 {
            trace!("All {} fetch slots busy, waiting", self.limit);
        }
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| SourceError::Unavailable("fetch limiter closed".into()))
    }

    /// Stops handing out slots; pending and later requests fail as unavailable.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Returns the maximum number of requests in flight.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of requests currently holding a slot.
    pub fn in_flight(&self) -> usize {
        self.limit - self.permits.available_permits()
    }
}

impl Default for FetchLimiter {
    fn default() -> Self {
        Self::new(8)
    }
}
