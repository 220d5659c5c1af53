//! Client factory and aggregate shutdown.
//!
//! [`EnsembleClientFactory`] assembles an [`EnsembleClientConfig`] from the
//! service configuration, applies a placement decision, and hands the result
//! to the caller's builder. The three cache slots it owns are the only state
//! shared between concurrent `create` calls; everything else is per call.

use crate::coordination::cache::{CacheSlot, TopologyCache};
use crate::coordination::session::CoordinationSession;
use crate::core::config::ServiceConfig;
use crate::core::error::{StrataError, StrataResult};
use crate::ensemble::builder::{AllocatorStrategy, EnsembleClientBuilder, NullStatsSink, StatsSink};
use crate::ensemble::config::{
    EnsembleClientConfig, HealthCheckSettings, TlsSettings, MESSAGE_FRAME_PADDING,
};
use crate::ensemble::placement::{decide_placement, PlacementDecision, PlacementPolicy, SlotPurpose};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Namespace watched for rack and region metadata.
pub const RACKS_NAMESPACE: &str = "nodes-racks";

/// Namespace watched for isolation-group metadata.
pub const ISOLATION_NAMESPACE: &str = "nodes-isolation";

/// Namespace watched on behalf of explicitly overridden policies.
pub const OVERRIDE_NAMESPACE: &str = "nodes-override";

/// Connections opened per storage node.
const NUM_CHANNELS_PER_NODE: u32 = 16;

static NULL_STATS: NullStatsSink = NullStatsSink;

/// Factory producing configured ensemble clients.
///
/// One factory instance per process is the expected wiring, but slots are
/// scoped to the instance, so independent factories stay independent.
#[derive(Debug)]
pub struct EnsembleClientFactory {
    rackaware_policy_cache: CacheSlot,
    isolation_policy_cache: CacheSlot,
    override_policy_cache: CacheSlot,
}

impl EnsembleClientFactory {
    /// Create a factory with empty cache slots.
    pub fn new() -> Self {
        Self {
            rackaware_policy_cache: CacheSlot::new(RACKS_NAMESPACE),
            isolation_policy_cache: CacheSlot::new(ISOLATION_NAMESPACE),
            override_policy_cache: CacheSlot::new(OVERRIDE_NAMESPACE),
        }
    }

    /// Build a configured ensemble client.
    ///
    /// `policy_override` bypasses the automatic placement rules.
    /// `extra_properties` are merged last and may overwrite anything set
    /// earlier. A `None` stats sink falls back to [`NullStatsSink`].
    ///
    /// Builder failure is logged with the attempted configuration and
    /// propagated as a construction error; the factory's cache slots stay
    /// populated for the next attempt.
    pub fn create<B: EnsembleClientBuilder>(
        &self,
        conf: &ServiceConfig,
        session: &Arc<dyn CoordinationSession>,
        policy_override: Option<PlacementPolicy>,
        extra_properties: Option<&BTreeMap<String, String>>,
        stats: Option<&dyn StatsSink>,
        builder: &B,
    ) -> StrataResult<B::Client> {
        let mut client_conf = self.client_configuration(conf)?;

        let decision = decide_placement(conf, policy_override.as_ref());
        self.apply_placement(&decision, &mut client_conf, conf, session)?;

        if let Some(extra) = extra_properties {
            for (key, value) in extra {
                client_conf.set_property(key.clone(), value.clone());
            }
        }

        client_conf.validate()?;

        let stats = stats.unwrap_or(&NULL_STATS);
        let rendered = format!("{:?}", client_conf);
        tracing::info!(stats = stats.id(), config = %rendered, "building ensemble client");

        match builder.build(client_conf, AllocatorStrategy::PooledDefault, stats) {
            Ok(client) => Ok(client),
            Err(error) => {
                tracing::error!(
                    stats = stats.id(),
                    config = %rendered,
                    %error,
                    "ensemble client construction failed"
                );
                Err(StrataError::construction("ensemble client", Box::new(error)))
            }
        }
    }

    /// Assemble the client configuration, placement aside.
    pub fn client_configuration(
        &self,
        conf: &ServiceConfig,
    ) -> StrataResult<EnsembleClientConfig> {
        let mut client = EnsembleClientConfig::new();

        if let Some(plugin) = conf.auth.plugin.as_deref() {
            if !plugin.trim().is_empty() {
                client.auth_provider_factory_class = Some(plugin.to_string());
                if let Some(parameters) = &conf.auth.parameters {
                    client.set_property(conf.auth.parameters_key.clone(), parameters.clone());
                }
            }
        }

        if conf.tls.client_authentication {
            client.tls = Some(TlsSettings {
                certificate_path: conf.tls.certificate_path.clone(),
                key_path: conf.tls.key_path.clone(),
                key_file_type: conf.tls.key_file_type.clone(),
                key_store_password_path: conf.tls.key_store_password_path.clone(),
                provider_factory_class: conf.tls.provider_factory_class.clone(),
                trust_certs_path: conf.tls.trust_certs_path.clone(),
                trust_cert_types: conf.tls.trust_cert_types.clone(),
                trust_store_password_path: conf.tls.trust_store_password_path.clone(),
            });
        }

        client.throttle_value = 0;
        client.add_entry_timeout_seconds = conf.client.timeout_seconds;
        client.read_entry_timeout_seconds = conf.client.timeout_seconds;
        client.speculative_read_timeout_ms = conf.client.speculative_read_timeout_ms;
        client.num_channels_per_node = NUM_CHANNELS_PER_NODE;
        client.use_v2_wire_protocol = conf.client.use_v2_wire_protocol;
        client.enable_digest_autodetection = true;
        client.sticky_reads_enabled = conf.client.sticky_reads_enabled;
        client.max_frame_size_bytes = conf.client.max_message_size + MESSAGE_FRAME_PADDING;
        client.disk_weight_placement_enabled = conf.client.disk_weight_placement_enabled;
        client.reorder_read_sequence_enabled = conf.client.reorder_read_sequence_enabled;
        client.explicit_lac_interval_ms = conf.client.explicit_lac_interval_ms;
        client.node_info_poll_interval_seconds = conf.client.node_info_poll_interval_seconds;
        client.node_info_poll_retry_interval_seconds =
            conf.client.node_info_poll_retry_interval_seconds;
        client.metadata_service_uri = conf.metadata_service_uri()?;

        if conf.health_check.enabled {
            client.health_check = Some(HealthCheckSettings {
                interval_seconds: conf.health_check.interval_seconds,
                error_threshold_per_interval: conf.health_check.error_threshold_per_interval,
                quarantine_seconds: conf.health_check.quarantine_seconds,
            });
        }

        Ok(client)
    }

    /// Apply a placement decision: write properties, bind the slot, attach
    /// its cache.
    fn apply_placement(
        &self,
        decision: &PlacementDecision,
        client_conf: &mut EnsembleClientConfig,
        conf: &ServiceConfig,
        session: &Arc<dyn CoordinationSession>,
    ) -> StrataResult<()> {
        if let Some(policy) = &decision.policy {
            client_conf.placement_policy = Some(policy.clone());
        }
        for (key, value) in &decision.properties {
            client_conf.set_property(key.clone(), value.clone());
        }
        if let Some(purpose) = decision.slot {
            let cache = self
                .slot(purpose)
                .get_or_create(session, conf.coordination.operation_timeout())?;
            client_conf.attach_topology_cache(cache);
        }
        Ok(())
    }

    fn slot(&self, purpose: SlotPurpose) -> &CacheSlot {
        match purpose {
            SlotPurpose::RackAwareness => &self.rackaware_policy_cache,
            SlotPurpose::Isolation => &self.isolation_policy_cache,
            SlotPurpose::Override => &self.override_policy_cache,
        }
    }

    /// Cache installed for rack and region metadata, if any.
    pub fn rackaware_policy_cache(&self) -> Option<Arc<TopologyCache>> {
        self.rackaware_policy_cache.get()
    }

    /// Cache installed for isolation-group metadata, if any.
    pub fn isolation_policy_cache(&self) -> Option<Arc<TopologyCache>> {
        self.isolation_policy_cache.get()
    }

    /// Cache installed for an explicitly overridden policy, if any.
    pub fn override_policy_cache(&self) -> Option<Arc<TopologyCache>> {
        self.override_policy_cache.get()
    }

    /// Stop every cache slot this factory created.
    ///
    /// Best-effort and idempotent per slot. Stop failures are logged inside
    /// the cache and never interrupt the remaining slots.
    pub fn close(&self) {
        self.rackaware_policy_cache.close();
        self.isolation_policy_cache.close();
        self.override_policy_cache.close();
    }
}

impl Default for EnsembleClientFactory {
    fn default() -> Self {
        Self::new()
    }
}
