//! Service configuration parsing and validation.
//!
//! The service configuration is loaded from TOML and treated as read-only
//! input: the client factory copies settings out of it but never writes back.
//! Free-form placement tunables live in the `[properties]` overlay so new
//! policy knobs do not require a schema change.

use crate::core::error::{StrataError, StrataResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Coordination-service connection settings.
    pub coordination: CoordinationConfig,

    /// Ensemble client tunables.
    #[serde(default)]
    pub client: ClientConfig,

    /// Client authentication plugin settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// TLS material for client authentication.
    #[serde(default)]
    pub tls: TlsConfig,

    /// Replica placement toggles and isolation groups.
    #[serde(default)]
    pub placement: PlacementConfig,

    /// Storage-node health checking.
    #[serde(default)]
    pub health_check: HealthCheckConfig,

    /// Free-form string overlay for policy tunables.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Coordination-service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// Coordination quorum, comma separated (e.g., "coord1:2181,coord2:2181").
    pub servers: String,

    /// Timeout for individual coordination operations, in seconds.
    #[serde(default = "default_operation_timeout_seconds")]
    pub operation_timeout_seconds: u64,
}

impl CoordinationConfig {
    /// Operation timeout as a Duration.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

/// Ensemble client tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout applied to both add and read operations, in seconds.
    #[serde(default = "default_client_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Speculative read trigger, in milliseconds. Zero disables.
    #[serde(default)]
    pub speculative_read_timeout_ms: u64,

    /// Use the v2 wire protocol.
    #[serde(default = "default_true")]
    pub use_v2_wire_protocol: bool,

    /// Route repeated reads of an entry to the same replica.
    #[serde(default)]
    pub sticky_reads_enabled: bool,

    /// Largest application message accepted, in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: u32,

    /// Explicit metadata service URI. Derived from the coordination quorum
    /// when blank.
    #[serde(default)]
    pub metadata_service_uri: Option<String>,

    /// Weight placement by advertised free disk.
    #[serde(default)]
    pub disk_weight_placement_enabled: bool,

    /// Reorder read sequences to prefer faster replicas.
    #[serde(default)]
    pub reorder_read_sequence_enabled: bool,

    /// Explicit last-add-confirmed publish interval, in milliseconds.
    /// Zero disables.
    #[serde(default)]
    pub explicit_lac_interval_ms: u64,

    /// Interval between storage-node info polls, in seconds.
    #[serde(default = "default_node_info_poll_interval_seconds")]
    pub node_info_poll_interval_seconds: u64,

    /// Retry interval after a failed storage-node info poll, in seconds.
    #[serde(default = "default_node_info_poll_retry_interval_seconds")]
    pub node_info_poll_retry_interval_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_client_timeout_seconds(),
            speculative_read_timeout_ms: 0,
            use_v2_wire_protocol: default_true(),
            sticky_reads_enabled: false,
            max_message_size: default_max_message_size(),
            metadata_service_uri: None,
            disk_weight_placement_enabled: false,
            reorder_read_sequence_enabled: false,
            explicit_lac_interval_ms: 0,
            node_info_poll_interval_seconds: default_node_info_poll_interval_seconds(),
            node_info_poll_retry_interval_seconds:
                default_node_info_poll_retry_interval_seconds(),
        }
    }
}

/// Client authentication plugin settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Authentication provider factory class name. Blank disables auth.
    #[serde(default)]
    pub plugin: Option<String>,

    /// Property key under which the parameter string is attached.
    #[serde(default = "default_auth_parameters_key")]
    pub parameters_key: String,

    /// Opaque parameter string handed to the provider.
    #[serde(default)]
    pub parameters: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            plugin: None,
            parameters_key: default_auth_parameters_key(),
            parameters: None,
        }
    }
}

/// TLS material for client authentication.
///
/// Paths are copied verbatim into the client configuration; no key material
/// is read or validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Enable TLS client authentication.
    #[serde(default)]
    pub client_authentication: bool,

    /// Client certificate path.
    #[serde(default)]
    pub certificate_path: String,

    /// Client key store path.
    #[serde(default)]
    pub key_path: String,

    /// Client key store type (e.g., "PEM").
    #[serde(default)]
    pub key_file_type: String,

    /// Path to the key store password file.
    #[serde(default)]
    pub key_store_password_path: String,

    /// TLS provider factory class name.
    #[serde(default)]
    pub provider_factory_class: String,

    /// Trust store path.
    #[serde(default)]
    pub trust_certs_path: String,

    /// Trust store type.
    #[serde(default)]
    pub trust_cert_types: String,

    /// Path to the trust store password file.
    #[serde(default)]
    pub trust_store_password_path: String,
}

/// Replica placement toggles and isolation groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Spread replicas across racks.
    #[serde(default)]
    pub rack_awareness_enabled: bool,

    /// Spread replicas across regions. Takes precedence over rack awareness.
    #[serde(default)]
    pub region_awareness_enabled: bool,

    /// Storage-node groups placement is restricted to.
    #[serde(default)]
    pub isolation_groups: Vec<String>,

    /// Fallback groups used when the primary groups lack capacity.
    #[serde(default)]
    pub secondary_isolation_groups: Vec<String>,
}

impl PlacementConfig {
    /// Isolation groups with surrounding whitespace removed and blank
    /// entries dropped.
    pub fn trimmed_isolation_groups(&self) -> Vec<String> {
        trim_groups(&self.isolation_groups)
    }

    /// Secondary isolation groups, trimmed the same way.
    pub fn trimmed_secondary_isolation_groups(&self) -> Vec<String> {
        trim_groups(&self.secondary_isolation_groups)
    }
}

fn trim_groups(groups: &[String]) -> Vec<String> {
    groups
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Storage-node health checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Enable periodic node health checks.
    #[serde(default)]
    pub enabled: bool,

    /// Interval between checks, in seconds.
    #[serde(default = "default_health_check_interval_seconds")]
    pub interval_seconds: u64,

    /// Errors tolerated per interval before a node is quarantined.
    #[serde(default = "default_health_check_error_threshold")]
    pub error_threshold_per_interval: u64,

    /// How long a quarantined node is excluded, in seconds.
    #[serde(default = "default_health_check_quarantine_seconds")]
    pub quarantine_seconds: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_health_check_interval_seconds(),
            error_threshold_per_interval: default_health_check_error_threshold(),
            quarantine_seconds: default_health_check_quarantine_seconds(),
        }
    }
}

// Default value functions

fn default_operation_timeout_seconds() -> u64 {
    30
}

fn default_client_timeout_seconds() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_max_message_size() -> u32 {
    5 * 1024 * 1024
}

fn default_node_info_poll_interval_seconds() -> u64 {
    86_400
}

fn default_node_info_poll_retry_interval_seconds() -> u64 {
    60
}

fn default_auth_parameters_key() -> String {
    "auth.params".to_string()
}

fn default_health_check_interval_seconds() -> u64 {
    60
}

fn default_health_check_error_threshold() -> u64 {
    5
}

fn default_health_check_quarantine_seconds() -> u64 {
    1_800
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ServiceConfig =
            toml::from_str(content).with_context(|| "failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    pub fn validate(&self) -> StrataResult<()> {
        self.validate_coordination()?;
        self.validate_client()?;
        self.validate_placement()?;
        self.validate_tls()?;
        self.validate_health_check()?;
        Ok(())
    }

    fn validate_coordination(&self) -> StrataResult<()> {
        if self.coordination.servers.trim().is_empty() {
            return Err(StrataError::configuration(
                "coordination.servers must not be blank",
            ));
        }
        if self.coordination.operation_timeout_seconds == 0 {
            return Err(StrataError::configuration(
                "coordination.operation_timeout_seconds must be > 0",
            ));
        }
        Ok(())
    }

    fn validate_client(&self) -> StrataResult<()> {
        if self.client.timeout_seconds == 0 {
            return Err(StrataError::configuration(
                "client.timeout_seconds must be > 0",
            ));
        }
        Ok(())
    }

    fn validate_placement(&self) -> StrataResult<()> {
        // A non-empty group list that trims down to nothing is a typo, not a
        // request for the default policy.
        if !self.placement.isolation_groups.is_empty()
            && self.placement.trimmed_isolation_groups().is_empty()
        {
            return Err(StrataError::configuration(
                "placement.isolation_groups contains only blank entries",
            ));
        }
        Ok(())
    }

    fn validate_tls(&self) -> StrataResult<()> {
        if self.tls.client_authentication {
            if self.tls.certificate_path.trim().is_empty() {
                return Err(StrataError::configuration(
                    "tls.certificate_path required when tls.client_authentication is enabled",
                ));
            }
            if self.tls.key_path.trim().is_empty() {
                return Err(StrataError::configuration(
                    "tls.key_path required when tls.client_authentication is enabled",
                ));
            }
        }
        Ok(())
    }

    fn validate_health_check(&self) -> StrataResult<()> {
        if self.health_check.enabled && self.health_check.interval_seconds == 0 {
            return Err(StrataError::configuration(
                "health_check.interval_seconds must be > 0 when enabled",
            ));
        }
        Ok(())
    }

    /// Resolve the metadata service URI.
    ///
    /// The explicit `client.metadata_service_uri` wins when non-blank;
    /// otherwise the URI is derived from the coordination quorum.
    pub fn metadata_service_uri(&self) -> StrataResult<String> {
        if let Some(uri) = &self.client.metadata_service_uri {
            if !uri.trim().is_empty() {
                return Ok(uri.clone());
            }
        }
        let servers = self.coordination.servers.trim();
        if servers.is_empty() {
            return Err(StrataError::configuration(
                "coordination.servers required to derive the metadata service uri",
            ));
        }
        // URI host lists use ';' where the quorum setting uses ','.
        Ok(format!("coord://{}/ledgers", servers.replace(',', ";")))
    }
}
