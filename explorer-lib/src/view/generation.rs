//! Stale-response rejection.
//!
//! The record source has no real cancellation, so a consumer that follows
//! one browsing context (a list bound to whichever view is current) keeps a
//! [`GenerationCounter`]. Each read captures the generation valid when it was
//! issued; when the context changes the consumer advances the counter, and
//! results that complete afterwards are dropped.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use log::debug;

/// Opaque token naming one generation of a consumer's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(u64);

/// Consumer-owned counter of context generations.
///
/// Cheap to clone; clones share the same counter.
///
/// # Example
///
/// ```
/// use explorer_lib::view::GenerationCounter;
///
/// let counter = GenerationCounter::new();
/// let issued = counter.current();
/// counter.advance();
/// assert!(!counter.is_current(issued));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Creates a counter at its first generation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the generation valid right now.
    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::Acquire))
    }

    /// Invalidates every outstanding read and returns the new generation.
    pub fn advance(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Returns `true` if `generation` has not been superseded.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }

    /// Awaits `read` and returns its output only if no context change
    /// happened in the meantime.
    pub async fn guard<F, T>(&self, read: F) -> Option<T>
    where
        F: Future<Output = T>,
    {
        let issued = self.current();
        let output = read.await;
        if self.is_current(issued) {
            Some(output)
        } else {
            debug!("Dropping stale response issued at {:?}", issued);
            None
        }
    }
}
