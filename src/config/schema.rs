//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the harness.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the tracing harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-request deadline budget.
    pub deadline: DeadlineConfig,

    /// Outer HTTP timeouts.
    pub timeouts: TimeoutConfig,

    /// Simulated work per operation.
    pub workloads: WorkloadsConfig,

    /// Tracer provider settings.
    pub tracer: TracerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:9999").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9999".to_string(),
        }
    }
}

/// Deadline established for every inbound request.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeadlineConfig {
    /// Budget from request arrival in milliseconds.
    pub budget_ms: u64,
}

impl DeadlineConfig {
    pub fn budget(&self) -> Duration {
        Duration::from_millis(self.budget_ms)
    }
}

impl Default for DeadlineConfig {
    fn default() -> Self {
        Self { budget_ms: 1000 }
    }
}

/// Timeout configuration for the HTTP layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Hard ceiling on a whole HTTP request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// How an operation's simulated work behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    /// Uniformly random delay in `0..ceiling_ms`.
    Random,
    /// Always exactly `ceiling_ms`.
    Fixed,
    /// Completes without delay.
    Immediate,
}

/// Simulated work of one operation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkloadConfig {
    pub kind: WorkloadKind,

    /// Upper bound of the simulated latency in milliseconds.
    #[serde(default)]
    pub ceiling_ms: u64,
}

impl WorkloadConfig {
    pub fn random(ceiling_ms: u64) -> Self {
        Self {
            kind: WorkloadKind::Random,
            ceiling_ms,
        }
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.ceiling_ms)
    }
}

/// Simulated work for each operation of the call tree.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkloadsConfig {
    pub auth_inner: WorkloadConfig,
    pub auth: WorkloadConfig,
    pub query: WorkloadConfig,
}

impl Default for WorkloadsConfig {
    fn default() -> Self {
        Self {
            auth_inner: WorkloadConfig::random(1100),
            auth: WorkloadConfig::random(1250),
            query: WorkloadConfig::random(1250),
        }
    }
}

/// Tracer provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracerConfig {
    /// Service name stamped on every span record.
    pub service_name: String,

    /// Log every finished span.
    pub log_spans: bool,

    /// Number of call trees kept for `/traces`.
    pub retain_traces: usize,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            service_name: "ts_server".to_string(),
            log_spans: true,
            retain_traces: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
