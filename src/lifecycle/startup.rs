//! Startup orchestration.
//!
//! # Responsibilities
//! - Assemble sinks and the tracer provider from config
//! - Build the standard operations and the call tree orchestrator
//! - Build the HTTP server around them
//!
//! # Design Decisions
//! - Fail fast: configuration is validated before anything is built
//! - Everything is constructed explicitly here; no globals

use std::sync::Arc;

use crate::call_tree::CallTree;
use crate::config::{validate_config, AppConfig, ConfigError};
use crate::http::HttpServer;
use crate::observability::sink::{CollectingSink, FanoutSink, LogSink, MetricsSink, SpanSink};
use crate::observability::tracer::Tracer;
use crate::operations::{standard_pipeline, StandardWorkloads};

/// Fully wired application.
pub struct App {
    pub server: HttpServer,
    pub tracer: Tracer,
    pub collector: Arc<CollectingSink>,
    pub call_tree: Arc<CallTree>,
}

/// Tracer reporting to `collector`, plus logs and metrics as configured.
pub fn build_tracer(config: &AppConfig, collector: Arc<CollectingSink>) -> Tracer {
    let mut sinks: Vec<Arc<dyn SpanSink>> = Vec::with_capacity(3);
    sinks.push(collector);
    sinks.push(Arc::new(MetricsSink));
    if config.tracer.log_spans {
        sinks.push(Arc::new(LogSink));
    }
    Tracer::new(
        config.tracer.service_name.clone(),
        Arc::new(FanoutSink::new(sinks)),
    )
}

/// Validate `config` and wire every component.
pub fn build_app(config: AppConfig) -> Result<App, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;

    let collector = Arc::new(CollectingSink::new(config.tracer.retain_traces));
    let tracer = build_tracer(&config, collector.clone());
    let stages = standard_pipeline(StandardWorkloads::from_config(&config.workloads));
    let call_tree = Arc::new(CallTree::new(
        tracer.clone(),
        config.deadline.budget(),
        stages,
    ));

    tracing::debug!(
        service = %tracer.service_name(),
        budget_ms = config.deadline.budget_ms,
        log_spans = config.tracer.log_spans,
        "Components built"
    );

    let server = HttpServer::new(config, call_tree.clone(), collector.clone());
    Ok(App {
        server,
        tracer,
        collector,
        call_tree,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = AppConfig::default();
        config.deadline.budget_ms = 0;
        assert!(matches!(build_app(config), Err(ConfigError::Validation(_))));
    }

    #[tokio::test]
    async fn test_built_app_handles_a_request() {
        let mut config = AppConfig::default();
        config.deadline.budget_ms = 2000;
        for workload in [
            &mut config.workloads.auth_inner,
            &mut config.workloads.auth,
            &mut config.workloads.query,
        ] {
            workload.kind = crate::config::WorkloadKind::Immediate;
        }

        let app = build_app(config).unwrap();
        let report = app.call_tree.handle("test").await;

        assert!(!report.failed());
        assert_eq!(app.collector.trace(&report.correlation_id).unwrap().len(), 4);
        assert_eq!(app.tracer.stats().open(), 0);
    }
}
