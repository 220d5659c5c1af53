//! Strata - client bootstrap for a replicated ledger-storage ensemble.
//!
//! Strata turns a service-level configuration into a fully configured client
//! handle for a distributed ledger-storage ensemble. It owns two concerns the
//! rest of the process should never re-implement: selecting a data-placement
//! policy (how replicas of each ledger are spread across failure domains) and
//! race-free lazy construction of the shared coordination-service topology
//! caches those policies consume.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Caller                                │
//! │        ServiceConfig │ CoordinationSession │ StatsSink          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    EnsembleClientFactory                        │
//! │   config assembly │ placement decision │ cache slot binding     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                  │
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   EnsembleClientBuilder                         │
//! │        (external: connections, RPC, replica selection)          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Module Organization
//!
//! ## Core
//! - [`core::config`] - Service configuration parsing and validation
//! - [`core::error`] - Error types
//!
//! ## Coordination
//! - [`coordination::session`] - Coordination-service session seam
//! - [`coordination::cache`] - Topology caches and exactly-once cache slots
//!
//! ## Ensemble
//! - [`ensemble::config`] - Client configuration property bag
//! - [`ensemble::placement`] - Placement-policy decision logic
//! - [`ensemble::builder`] - Ensemble client builder seam
//! - [`ensemble::factory`] - Client factory and aggregate shutdown
//!
//! # Key Invariants
//!
//! - **SLOT-ONCE**: a cache slot installs exactly one handle per factory
//!   lifetime; every concurrently constructed loser is stopped, not leaked
//! - **CACHE-FIRST-WINS**: the client configuration carries at most one
//!   topology-cache handle; once attached it is never replaced
//! - **TOTAL-SHUTDOWN**: factory close stops every slot it created, and a
//!   failure stopping one slot never prevents stopping the rest

// Core infrastructure
pub mod core;

// Coordination-service integration
pub mod coordination;

// Ensemble client configuration and construction
pub mod ensemble;

// Re-exports for convenience
pub use self::core::{config, error};
pub use coordination::{cache, session};
pub use ensemble::{builder, factory, placement};
