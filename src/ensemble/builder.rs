//! Builder and stats-sink seams presented by the ensemble client library.
//!
//! The client library itself, with its connection management and RPC
//! machinery, lives outside this crate. The factory only needs a builder
//! that accepts a finished configuration and either returns a client handle
//! or fails with its own error type.

use crate::ensemble::config::EnsembleClientConfig;

/// Buffer allocation strategy handed to the client builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorStrategy {
    /// Pooled buffers shared process-wide.
    PooledDefault,
    /// Plain heap allocation, for tools and tests.
    Unpooled,
}

/// Statistics sink wired into the constructed client.
pub trait StatsSink: Send + Sync {
    /// Sink identity used in construction logs.
    fn id(&self) -> &str;
}

/// Sink that discards every statistic. Used when the caller supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullStatsSink;

impl StatsSink for NullStatsSink {
    fn id(&self) -> &str {
        "null"
    }
}

/// Builder for the external ensemble client.
pub trait EnsembleClientBuilder {
    /// The client handle produced on success.
    type Client;

    /// The builder's own failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build a client from a finished configuration.
    ///
    /// Takes the configuration by value: the builder owns it afterwards.
    fn build(
        &self,
        config: EnsembleClientConfig,
        allocator: AllocatorStrategy,
        stats: &dyn StatsSink,
    ) -> Result<Self::Client, Self::Error>;
}
