//! Client configuration property bag.
//!
//! [`EnsembleClientConfig`] is assembled by the factory, then consumed once
//! by the ensemble client builder, which takes ownership. Typed fields cover
//! the settings this crate knows about; everything else travels in the
//! string property map.

use crate::coordination::cache::TopologyCache;
use crate::core::error::{StrataError, StrataResult};
use crate::ensemble::placement::PlacementPolicy;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Fixed framing overhead added on top of the largest application message
/// when sizing the wire frame.
pub const MESSAGE_FRAME_PADDING: u32 = 10 * 1024;

/// TLS settings copied verbatim from the service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    pub certificate_path: String,
    pub key_path: String,
    pub key_file_type: String,
    pub key_store_password_path: String,
    pub provider_factory_class: String,
    pub trust_certs_path: String,
    pub trust_cert_types: String,
    pub trust_store_password_path: String,
}

/// Storage-node health-check settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheckSettings {
    pub interval_seconds: u64,
    pub error_threshold_per_interval: u64,
    pub quarantine_seconds: u64,
}

/// Configuration handed to the ensemble client builder.
#[derive(Debug, Clone, Default)]
pub struct EnsembleClientConfig {
    /// Authentication provider factory class, when auth is configured.
    pub auth_provider_factory_class: Option<String>,

    /// TLS material, when TLS client authentication is enabled.
    pub tls: Option<TlsSettings>,

    /// Client-side write throttle. Zero means unthrottled.
    pub throttle_value: u64,

    /// Add-operation timeout, in seconds.
    pub add_entry_timeout_seconds: u64,

    /// Read-operation timeout, in seconds.
    pub read_entry_timeout_seconds: u64,

    /// Speculative read trigger, in milliseconds.
    pub speculative_read_timeout_ms: u64,

    /// Connections opened per storage node.
    pub num_channels_per_node: u32,

    /// Use the v2 wire protocol.
    pub use_v2_wire_protocol: bool,

    /// Detect entry digest types instead of assuming the configured one.
    pub enable_digest_autodetection: bool,

    /// Route repeated reads of an entry to the same replica.
    pub sticky_reads_enabled: bool,

    /// Largest wire frame accepted, in bytes.
    pub max_frame_size_bytes: u32,

    /// Weight placement by advertised free disk.
    pub disk_weight_placement_enabled: bool,

    /// Reorder read sequences to prefer faster replicas.
    pub reorder_read_sequence_enabled: bool,

    /// Explicit last-add-confirmed publish interval, in milliseconds.
    pub explicit_lac_interval_ms: u64,

    /// Interval between storage-node info polls, in seconds.
    pub node_info_poll_interval_seconds: u64,

    /// Retry interval after a failed storage-node info poll, in seconds.
    pub node_info_poll_retry_interval_seconds: u64,

    /// Metadata service URI.
    pub metadata_service_uri: String,

    /// Health-check settings, when enabled.
    pub health_check: Option<HealthCheckSettings>,

    /// Selected placement policy. `None` leaves the builder default.
    pub placement_policy: Option<PlacementPolicy>,

    /// Topology cache backing the placement policy.
    topology_cache: Option<Arc<TopologyCache>>,

    /// String property overlay.
    properties: BTreeMap<String, String>,
}

impl EnsembleClientConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a string property.
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Read a string property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The full property overlay.
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Attach the topology cache backing the placement policy.
    ///
    /// The first attached cache wins; later attempts are ignored so a
    /// composing placement branch never replaces the handle an earlier
    /// branch installed.
    pub fn attach_topology_cache(&mut self, cache: Arc<TopologyCache>) {
        if self.topology_cache.is_none() {
            self.topology_cache = Some(cache);
        }
    }

    /// The attached topology cache, if any.
    pub fn topology_cache(&self) -> Option<&Arc<TopologyCache>> {
        self.topology_cache.as_ref()
    }

    /// Validate that the configuration is complete enough to build from.
    ///
    /// A selected placement policy must carry a topology cache; the policies
    /// this factory selects all read coordination metadata.
    pub fn validate(&self) -> StrataResult<()> {
        if self.placement_policy.is_some() && self.topology_cache.is_none() {
            return Err(StrataError::configuration(
                "placement policy selected without a topology cache attached",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordination::session::CoordinationSession;
    use crate::core::error::BoxError;
    use std::time::Duration;

    struct StubSession;
    impl CoordinationSession for StubSession {
        fn endpoint(&self) -> &str {
            "coord-test:2181"
        }
        fn register_watch(&self, _namespace: &str) -> Result<(), BoxError> {
            Ok(())
        }
        fn remove_watch(&self, _namespace: &str) -> Result<(), BoxError> {
            Ok(())
        }
    }

    fn cache(namespace: &str) -> Arc<TopologyCache> {
        TopologyCache::open(namespace, Arc::new(StubSession), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn first_attached_cache_wins() {
        let mut config = EnsembleClientConfig::new();
        let first = cache("nodes-racks");
        let second = cache("nodes-isolation");

        config.attach_topology_cache(first.clone());
        config.attach_topology_cache(second);

        assert!(Arc::ptr_eq(config.topology_cache().unwrap(), &first));
    }

    #[test]
    fn validate_requires_cache_for_selected_policy() {
        let mut config = EnsembleClientConfig::new();
        config.placement_policy = Some(PlacementPolicy::RackAware);
        assert!(config.validate().unwrap_err().is_configuration());

        config.attach_topology_cache(cache("nodes-racks"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_accepts_builder_default_policy() {
        let config = EnsembleClientConfig::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn properties_overwrite_by_key() {
        let mut config = EnsembleClientConfig::new();
        config.set_property("placement.dns_resolver_class", "a");
        config.set_property("placement.dns_resolver_class", "b");
        assert_eq!(config.property("placement.dns_resolver_class"), Some("b"));
    }
}
