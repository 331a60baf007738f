//! Service context bundling all port trait objects.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::live::{ConsoleNotifier, PollingFeed, RestBackend, SystemClock};
use crate::adapters::memory::MemoryStore;
use crate::config::{Backend, BoardConfig};
use crate::ports::{ChangeFeedSource, Clock, Notifier, ObjectStorage, TaskStore};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors wire up
/// different adapter families (rest, memory, memory persisted to a snapshot).
pub struct ServiceContext {
    /// Remote task and client rows.
    pub store: Arc<dyn TaskStore>,
    /// Document object storage.
    pub storage: Arc<dyn ObjectStorage>,
    /// Transport for remote change notifications.
    pub changes: Box<dyn ChangeFeedSource>,
    /// Transient user-visible notifications.
    pub notifier: Box<dyn Notifier>,
    /// Clock for session timestamps.
    pub clock: Box<dyn Clock>,
    /// Memory store written back to its snapshot file on drop.
    snapshot: Option<(Arc<MemoryStore>, PathBuf)>,
}

impl ServiceContext {
    /// Creates a context talking to the remote store over HTTP, with a
    /// polling change feed.
    ///
    /// # Errors
    ///
    /// Returns an error if no store URL is configured.
    pub fn live(config: &BoardConfig) -> Result<Self, String> {
        let url = config.url.as_deref().ok_or("No store URL configured (set CAREBOARD_URL)")?;
        let backend = Arc::new(RestBackend::new(url, config.api_key.clone(), &config.bucket));
        tracing::debug!(url, bucket = %config.bucket, "using rest backend");

        Ok(Self {
            store: Arc::clone(&backend) as Arc<dyn TaskStore>,
            storage: Arc::clone(&backend) as Arc<dyn ObjectStorage>,
            changes: Box::new(PollingFeed::new(backend, config.poll_interval())),
            notifier: Box::new(ConsoleNotifier),
            clock: Box::new(SystemClock),
            snapshot: None,
        })
    }

    /// Creates a context over an in-memory store, subscribed to its change feed.
    #[must_use]
    pub fn memory(store: Arc<MemoryStore>, notifier: Box<dyn Notifier>) -> Self {
        Self {
            changes: Box::new(store.subscribe()),
            store: Arc::clone(&store) as Arc<dyn TaskStore>,
            storage: store as Arc<dyn ObjectStorage>,
            notifier,
            clock: Box::new(SystemClock),
            snapshot: None,
        }
    }

    /// Creates a memory context loaded from a YAML snapshot file.
    ///
    /// The store is written back to `path` when this context is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot file exists but cannot be parsed.
    pub fn snapshot(path: &Path) -> Result<Self, String> {
        let store = Arc::new(MemoryStore::load(path, Box::new(SystemClock))?);
        tracing::debug!(path = %path.display(), "using memory backend");
        let mut ctx = Self::memory(Arc::clone(&store), Box::new(ConsoleNotifier));
        ctx.snapshot = Some((store, path.to_path_buf()));
        Ok(ctx)
    }

    /// Creates the context selected by the configured backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected backend cannot be set up.
    pub fn from_config(config: &BoardConfig) -> Result<Self, String> {
        match config.backend {
            Backend::Rest => Self::live(config),
            Backend::Memory => Self::snapshot(&config.snapshot),
        }
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        if let Some((store, path)) = self.snapshot.take() {
            if let Err(e) = store.save(&path) {
                eprintln!("Warning: failed to write snapshot: {e}");
            }
        }
    }
}
