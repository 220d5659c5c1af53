//! Coordination-service integration.
//!
//! This module handles interaction with the distributed coordination service
//! that stores dynamic topology metadata:
//! - [`session`] - Session seam presented by the external coordination client
//! - [`cache`] - Topology caches and exactly-once cache slots
//!
//! # Cache Ownership
//!
//! Topology caches are expensive and must be singletons per purpose. Each
//! [`cache::CacheSlot`] installs at most one cache for its namespace; slots
//! are owned by the client factory, not process-global, so independent
//! factories never share or leak caches across tests.

pub mod cache;
pub mod session;
