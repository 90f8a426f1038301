//! View configuration

/// Paging and fetch settings shared by every view of a registry.
///
/// # Example
///
/// ```
/// use explorer_lib::view::ViewConfig;
///
/// let config = ViewConfig::default()
///     .with_page_size(250)
///     .with_max_concurrent_fetches(4);
/// assert_eq!(config.page_size, 250);
/// ```
#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Number of rows requested per page fetch.
    ///
    /// Default: 100
    pub page_size: usize,

    /// Maximum number of source requests in flight at once, across all views.
    ///
    /// Default: 8
    pub max_concurrent_fetches: usize,

    /// Capacity of each view's event channel.
    ///
    /// Default: 64
    pub event_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            max_concurrent_fetches: 8,
            event_capacity: 64,
        }
    }
}

impl ViewConfig {
    /// Creates a new view config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size. Zero is raised to one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the maximum number of concurrent source requests.
    pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
        self.max_concurrent_fetches = limit;
        self
    }

    /// Sets the event channel capacity. Zero is raised to one.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
