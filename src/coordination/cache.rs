//! Topology caches and exactly-once cache slots.
//!
//! A [`TopologyCache`] is a locally cached view of rack and isolation
//! metadata, refreshed through a coordination-service watch. Construction
//! registers the watch and is therefore not free to repeat, so shared caches
//! go through a [`CacheSlot`]: a lazily populated holder that survives any
//! number of concurrent first uses with exactly one live cache.
//!
//! The slot does not lock around construction. Racing callers each build a
//! cache outside the critical section, then compare-and-set it into the
//! slot; losers stop their freshly built cache and adopt the winner's.

use crate::coordination::session::CoordinationSession;
use crate::core::error::{StrataError, StrataResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Cached view of storage-node topology under one metadata namespace.
pub struct TopologyCache {
    /// Metadata namespace this cache watches.
    namespace: String,

    /// Session the watch is registered on.
    session: Arc<dyn CoordinationSession>,

    /// Timeout applied to coordination operations issued by consumers.
    operation_timeout: Duration,

    /// Stop guard. The watch is removed at most once.
    stopped: AtomicBool,
}

impl TopologyCache {
    /// Open a cache over `namespace`, registering its watch on `session`.
    pub fn open(
        namespace: &str,
        session: Arc<dyn CoordinationSession>,
        operation_timeout: Duration,
    ) -> StrataResult<Arc<Self>> {
        session.register_watch(namespace).map_err(|source| {
            StrataError::construction(format!("topology cache for '{}'", namespace), source)
        })?;
        tracing::debug!(
            namespace = %namespace,
            endpoint = %session.endpoint(),
            "opened topology cache"
        );
        Ok(Arc::new(Self {
            namespace: namespace.to_string(),
            session,
            operation_timeout,
            stopped: AtomicBool::new(false),
        }))
    }

    /// Metadata namespace this cache watches.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Timeout applied to coordination operations issued by consumers.
    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Check if this cache has been stopped.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop the cache and remove its watch.
    ///
    /// Idempotent, and never fails observably: a watch-removal error is
    /// logged and swallowed.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Err(error) = self.session.remove_watch(&self.namespace) {
            tracing::warn!(
                namespace = %self.namespace,
                endpoint = %self.session.endpoint(),
                %error,
                "failed to remove topology watch during stop"
            );
        } else {
            tracing::debug!(namespace = %self.namespace, "stopped topology cache");
        }
    }
}

impl std::fmt::Debug for TopologyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyCache")
            .field("namespace", &self.namespace)
            .field("endpoint", &self.session.endpoint())
            .field("operation_timeout", &self.operation_timeout)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Lazily populated, exactly-once holder of one [`TopologyCache`].
#[derive(Debug)]
pub struct CacheSlot {
    /// Namespace caches installed here watch.
    namespace: String,

    /// Installed cache, if any. Populated at most once.
    cell: OnceLock<Arc<TopologyCache>>,
}

impl CacheSlot {
    /// Create an empty slot for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            cell: OnceLock::new(),
        }
    }

    /// Namespace caches installed here watch.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Currently installed cache, without creating one.
    pub fn get(&self) -> Option<Arc<TopologyCache>> {
        self.cell.get().cloned()
    }

    /// Return the installed cache, opening one on first use.
    ///
    /// Concurrent first uses may each open a cache; exactly one is installed
    /// and every loser is stopped before being discarded. Callers only ever
    /// observe the surviving cache.
    pub fn get_or_create(
        &self,
        session: &Arc<dyn CoordinationSession>,
        operation_timeout: Duration,
    ) -> StrataResult<Arc<TopologyCache>> {
        if let Some(existing) = self.cell.get() {
            return Ok(existing.clone());
        }
        let fresh = TopologyCache::open(&self.namespace, session.clone(), operation_timeout)?;
        match self.cell.set(fresh.clone()) {
            Ok(()) => Ok(fresh),
            Err(losing) => {
                losing.stop();
                Ok(self
                    .cell
                    .get()
                    .expect("slot is populated after a lost install race")
                    .clone())
            }
        }
    }

    /// Stop the installed cache, if any.
    ///
    /// Idempotent: closing twice, or closing an empty slot, is a no-op.
    pub fn close(&self) {
        if let Some(cache) = self.cell.get() {
            cache.stop();
        }
    }
}
