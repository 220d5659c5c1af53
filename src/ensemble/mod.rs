//! Ensemble client configuration and construction.
//!
//! This module turns a [`crate::core::config::ServiceConfig`] into a live
//! ensemble client:
//! - [`config`] - Client configuration property bag
//! - [`placement`] - Placement-policy decision logic
//! - [`builder`] - Builder and stats-sink seams presented by the client library
//! - [`factory`] - Client factory and aggregate shutdown
//!
//! # Placement Composition
//!
//! Rack or region awareness and isolation groups are independent axes. When
//! both apply, the isolation policy wins the policy class while the rack
//! branch's resolver property and topology cache remain bound, so a single
//! cache serves both concerns.

pub mod builder;
pub mod config;
pub mod factory;
pub mod placement;
