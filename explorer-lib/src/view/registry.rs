//! One live view per identity.

use std::sync::Arc;
use std::sync::Weak;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::debug;
use tokio::runtime::Handle;

use super::FetchLimiter;
use super::View;
use super::ViewConfig;
use super::ViewInner;
use crate::error::Error;
use crate::query::ViewIdentity;
use crate::query::ViewKey;
use crate::source::RecordSource;

/// Hands out views over one record source.
///
/// Asking twice for the same identity (in any filter order) returns the same
/// live view, so its cache and in-flight fetches are shared. The registry
/// only holds weak references: a view and its cache are discarded once the
/// last clone is dropped.
///
/// This registry is cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// use explorer_lib::query::ViewIdentity;
/// use explorer_lib::source::InMemorySource;
/// use explorer_lib::view::ViewRegistry;
///
/// let registry = ViewRegistry::new(InMemorySource::default())?;
/// let a = registry.view(ViewIdentity::all());
/// let b = registry.view(ViewIdentity::all());
/// assert!(a.equals(&b));
/// ```
#[derive(Clone)]
pub struct ViewRegistry {
    inner: Arc<ViewRegistryInner>,
}

struct ViewRegistryInner {
    source: Arc<dyn RecordSource>,
    config: ViewConfig,
    limiter: FetchLimiter,
    runtime: Handle,
    views: DashMap<ViewKey, Weak<ViewInner>>,
}

impl ViewRegistry {
    /// Creates a registry with the default config on the current tokio runtime.
    pub fn new(source: impl RecordSource + 'static) -> Result<Self, Error> {
        Self::builder(source).build()
    }

    /// Creates a new builder for constructing a registry.
    pub fn builder(source: impl RecordSource + 'static) -> ViewRegistryBuilder {
        ViewRegistryBuilder::new(Arc::new(source))
    }

    /// Returns the live view for `identity`, opening it if needed.
    ///
    /// Opening a view also forgets views that are no longer referenced.
    pub fn view(&self, identity: ViewIdentity) -> View {
        let key = identity.key();
        let live = self
            .inner
            .views
            .get(&key)
            .and_then(|entry| View::upgrade(entry.value()));
        if let Some(view) = live {
            return view;
        }

        self.prune();
        match self.inner.views.entry(key) {
            Entry::Occupied(mut entry) => {
                if let Some(view) = View::upgrade(entry.get()) {
                    return view;
                }
                let view = self.open(identity);
                entry.insert(view.downgrade());
                view
            }
            Entry::Vacant(entry) => {
                let view = self.open(identity);
                entry.insert(view.downgrade());
                view
            }
        }
    }

    /// Returns the number of views still referenced somewhere.
    pub fn live_views(&self) -> usize {
        self.prune();
        self.inner.views.len()
    }

    fn prune(&self) {
        self.inner.views.retain(|key, view| {
            let alive = view.strong_count() > 0;
            if !alive {
                debug!("Discarding view {}", key);
            }
            alive
        });
    }

    /// Returns the record source shared by every view.
    pub fn source(&self) -> &Arc<dyn RecordSource> {
        &self.inner.source
    }

    /// Returns the view configuration.
    pub fn config(&self) -> &ViewConfig {
        &self.inner.config
    }

    fn open(&self, identity: ViewIdentity) -> View {
        View::new(
            identity,
            Arc::clone(&self.inner.source),
            &self.inner.config,
            self.inner.limiter.clone(),
            self.inner.runtime.clone(),
        )
    }
}

/// Builder for constructing a [`ViewRegistry`].
///
/// # Example
///
/// ```ignore
/// let registry = ViewRegistry::builder(source)
///     .config(ViewConfig::default().with_page_size(250))
///     .runtime(tokio::runtime::Handle::current())
///     .build()?;
/// ```
pub struct ViewRegistryBuilder {
    source: Arc<dyn RecordSource>,
    config: ViewConfig,
    runtime: Option<Handle>,
}

impl ViewRegistryBuilder {
    fn new(source: Arc<dyn RecordSource>) -> Self {
        Self {
            source,
            config: ViewConfig::default(),
            runtime: None,
        }
    }

    /// Creates a builder around an already shared source.
    pub fn from_shared(source: Arc<dyn RecordSource>) -> Self {
        Self::new(source)
    }

    /// Sets the view configuration.
    pub fn config(mut self, config: ViewConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the runtime that drives background page fetches.
    ///
    /// Defaults to the runtime current when [`build`](Self::build) is called.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the [`ViewRegistry`].
    ///
    /// Fails with [`Error::NoRuntime`] if no runtime was set and none is current.
    pub fn build(self) -> Result<ViewRegistry, Error> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        Ok(ViewRegistry {
            inner: Arc::new(ViewRegistryInner {
                source: self.source,
                limiter: FetchLimiter::new(self.config.max_concurrent_fetches),
                config: self.config,
                runtime,
                views: DashMap::new(),
            }),
        })
    }
}
