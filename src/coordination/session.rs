//! Coordination-service session seam.
//!
//! The live coordination connection is owned by the caller and passed in as
//! a trait object. Strata only needs enough of its surface to open and close
//! namespace watches for topology caches.

use crate::core::error::BoxError;

/// Handle to a live coordination-service session.
pub trait CoordinationSession: Send + Sync {
    /// Connection identity used in logs (e.g., the quorum address).
    fn endpoint(&self) -> &str;

    /// Register a watch over a metadata namespace.
    fn register_watch(&self, namespace: &str) -> Result<(), BoxError>;

    /// Remove a previously registered watch.
    fn remove_watch(&self, namespace: &str) -> Result<(), BoxError>;
}
