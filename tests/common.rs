//! Common test utilities.
//!
//! This module contains shared helpers for integration tests.
//! Import with `mod common;` in test files.

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use strata::core::config::ServiceConfig;
use strata::core::error::BoxError;
use strata::coordination::session::CoordinationSession;
use strata::ensemble::builder::{AllocatorStrategy, EnsembleClientBuilder, StatsSink};
use strata::ensemble::config::EnsembleClientConfig;
use tempfile::NamedTempFile;

/// Minimal valid configuration: a coordination quorum and nothing else.
pub const MINIMAL_CONFIG: &str = r#"
[coordination]
servers = "coord1:2181,coord2:2181"
"#;

/// Load a ServiceConfig from inline TOML.
pub fn service_config(content: &str) -> ServiceConfig {
    ServiceConfig::from_toml(content).expect("Failed to parse config")
}

/// Write a configuration to a temp file.
pub fn write_config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");
    file
}

/// Coordination session that records watch registrations and removals.
pub struct MockSession {
    endpoint: String,
    pub registered: Mutex<Vec<String>>,
    pub removed: Mutex<Vec<String>>,
    pub refuse_register: AtomicBool,
}

impl MockSession {
    pub fn new(endpoint: &str) -> Arc<Self> {
        Arc::new(Self {
            endpoint: endpoint.to_string(),
            registered: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            refuse_register: AtomicBool::new(false),
        })
    }

    /// The session as the trait object the factory consumes.
    pub fn as_session(self: &Arc<Self>) -> Arc<dyn CoordinationSession> {
        self.clone()
    }

    /// Watches registered so far.
    pub fn registered_count(&self) -> usize {
        self.registered.lock().unwrap().len()
    }

    /// Watches removed so far.
    pub fn removed_count(&self) -> usize {
        self.removed.lock().unwrap().len()
    }

    /// Watches currently live (registered minus removed).
    pub fn live_watches(&self) -> usize {
        self.registered_count() - self.removed_count()
    }
}

impl CoordinationSession for MockSession {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn register_watch(&self, namespace: &str) -> Result<(), BoxError> {
        if self.refuse_register.load(Ordering::Relaxed) {
            return Err("watch registration refused".into());
        }
        self.registered.lock().unwrap().push(namespace.to_string());
        Ok(())
    }

    fn remove_watch(&self, namespace: &str) -> Result<(), BoxError> {
        self.removed.lock().unwrap().push(namespace.to_string());
        Ok(())
    }
}

/// Client handle produced by the recording builder.
#[derive(Debug, PartialEq, Eq)]
pub struct FakeLedgerClient;

/// Builder that captures what it was invoked with, optionally failing.
#[derive(Default)]
pub struct RecordingBuilder {
    pub fail: bool,
    pub captured: Mutex<Option<EnsembleClientConfig>>,
    pub allocator: Mutex<Option<AllocatorStrategy>>,
    pub stats_id: Mutex<Option<String>>,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// The configuration captured by the last build call.
    pub fn config(&self) -> EnsembleClientConfig {
        self.captured
            .lock()
            .unwrap()
            .clone()
            .expect("no build call captured")
    }
}

impl EnsembleClientBuilder for RecordingBuilder {
    type Client = FakeLedgerClient;
    type Error = std::io::Error;

    fn build(
        &self,
        config: EnsembleClientConfig,
        allocator: AllocatorStrategy,
        stats: &dyn StatsSink,
    ) -> Result<FakeLedgerClient, std::io::Error> {
        *self.captured.lock().unwrap() = Some(config);
        *self.allocator.lock().unwrap() = Some(allocator);
        *self.stats_id.lock().unwrap() = Some(stats.id().to_string());
        if self.fail {
            return Err(std::io::Error::other("ensemble unavailable"));
        }
        Ok(FakeLedgerClient)
    }
}

/// Stats sink with a recognizable identity.
pub struct NamedStatsSink(pub &'static str);

impl StatsSink for NamedStatsSink {
    fn id(&self) -> &str {
        self.0
    }
}
