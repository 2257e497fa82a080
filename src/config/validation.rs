//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (budgets > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{AppConfig, WorkloadConfig, WorkloadKind};

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid listener bind address `{0}`")]
    InvalidBindAddress(String),
    #[error("deadline budget must be greater than zero")]
    ZeroDeadlineBudget,
    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,
    #[error("request timeout ({request_ms}ms) must exceed the deadline budget ({budget_ms}ms)")]
    RequestTimeoutBelowBudget { request_ms: u64, budget_ms: u64 },
    #[error("workload `{0}` needs a ceiling greater than zero")]
    ZeroWorkloadCeiling(&'static str),
    #[error("tracer service name must not be empty")]
    EmptyServiceName,
    #[error("tracer must retain at least one call tree")]
    ZeroRetention,
    #[error("invalid metrics address `{0}`")]
    InvalidMetricsAddress(String),
}

/// Check every semantic rule and report all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.deadline.budget_ms == 0 {
        errors.push(ValidationError::ZeroDeadlineBudget);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    } else {
        let request_ms = config.timeouts.request_secs.saturating_mul(1000);
        if request_ms <= config.deadline.budget_ms {
            errors.push(ValidationError::RequestTimeoutBelowBudget {
                request_ms,
                budget_ms: config.deadline.budget_ms,
            });
        }
    }

    let workloads = &config.workloads;
    for (name, workload) in [
        ("auth_inner", &workloads.auth_inner),
        ("auth", &workloads.auth),
        ("query", &workloads.query),
    ] {
        if needs_ceiling(workload) && workload.ceiling_ms == 0 {
            errors.push(ValidationError::ZeroWorkloadCeiling(name));
        }
    }

    if config.tracer.service_name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }
    if config.tracer.retain_traces == 0 {
        errors.push(ValidationError::ZeroRetention);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn needs_ceiling(workload: &WorkloadConfig) -> bool {
    matches!(workload.kind, WorkloadKind::Random | WorkloadKind::Fixed)
}
