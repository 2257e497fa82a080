//! Call tree orchestration.
//!
//! # Responsibilities
//! - Establish the deadline at the request boundary
//! - Open and close the root span
//! - Run the top-level stages in sequence, short-circuiting on failure
//! - Produce the acknowledgement returned to the client
//!
//! # Design Decisions
//! - Failures are recorded on spans, never turned into an error response
//! - The deadline guard lives for the whole call and is released on return
//! - No parallelism inside one tree; trees of different requests never share state

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;

use crate::call_tree::state::{CallTreeState, StateTrail};
use crate::observability::span::CorrelationId;
use crate::observability::tracer::Tracer;
use crate::operations::context::CallContext;
use crate::operations::error::OperationError;
use crate::operations::operation::Operation;
use crate::resilience::deadline::DeadlineContext;

/// Name of the root span of every call tree.
pub const ROOT_SPAN: &str = "request";

/// Body returned for every request.
pub const ACKNOWLEDGEMENT: &str = "hello\n";

/// What happened to one top-level stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded { operation: String },
    Failed { operation: String, error: String, root_cause: String },
    Skipped { operation: String },
}

impl StageOutcome {
    pub fn operation(&self) -> &str {
        match self {
            Self::Succeeded { operation }
            | Self::Failed { operation, .. }
            | Self::Skipped { operation } => operation,
        }
    }
}

/// Result of handling one request.
#[derive(Debug, Clone, Serialize)]
pub struct CallTreeReport {
    pub correlation_id: CorrelationId,
    pub trail: StateTrail,
    pub stages: Vec<StageOutcome>,
    /// First failure, as recorded on the root span.
    #[serde(skip)]
    pub failure: Option<OperationError>,
    pub body: &'static str,
}

impl CallTreeReport {
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Entry point of one request's call tree.
#[derive(Debug)]
pub struct CallTree {
    tracer: Tracer,
    budget: Duration,
    stages: Vec<Arc<Operation>>,
}

impl CallTree {
    pub fn new(tracer: Tracer, budget: Duration, stages: Vec<Arc<Operation>>) -> Self {
        Self {
            tracer,
            budget,
            stages,
        }
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Run one call tree to completion. Always reaches `ResponseEmitted`.
    pub async fn handle(&self, request_id: &str) -> CallTreeReport {
        let mut trail = StateTrail::new();

        let (deadline, _deadline_guard) = DeadlineContext::with_budget(self.budget);
        trail.advance(CallTreeState::DeadlineEstablished);

        let mut root = self.tracer.start_root(ROOT_SPAN);
        let correlation_id = root.correlation_id();
        trail.advance(CallTreeState::RootSpanOpen);
        tracing::debug!(
            request_id = %request_id,
            correlation_id = %correlation_id,
            budget_ms = self.budget.as_millis() as u64,
            "Call tree started"
        );

        let cx = CallContext::new(deadline, root.handle().clone());
        let (stages, failure) = self
            .run_stages(&cx, &mut trail)
            .instrument(root.tracing_span().clone())
            .await;

        if let Some(err) = &failure {
            if let Err(span_err) = root.record_error(err) {
                tracing::error!(error = %span_err, "Failed to record error on root span");
            }
        }
        if let Err(span_err) = root.finish() {
            tracing::error!(error = %span_err, "Root span finished twice");
        }
        trail.advance(CallTreeState::RootSpanClosed);

        crate::observability::metrics::record_request(failure.is_some());
        tracing::info!(
            request_id = %request_id,
            correlation_id = %correlation_id,
            failed = failure.is_some(),
            "Call tree finished"
        );
        trail.advance(CallTreeState::ResponseEmitted);

        CallTreeReport {
            correlation_id,
            trail,
            stages,
            failure,
            body: ACKNOWLEDGEMENT,
        }
    }

    async fn run_stages(
        &self,
        cx: &CallContext,
        trail: &mut StateTrail,
    ) -> (Vec<StageOutcome>, Option<OperationError>) {
        let mut outcomes = Vec::with_capacity(self.stages.len());
        let mut failure = None;

        for stage in &self.stages {
            let operation = stage.name().to_string();
            if failure.is_some() {
                tracing::debug!(operation = %operation, "Skipping stage after earlier failure");
                outcomes.push(StageOutcome::Skipped { operation });
                continue;
            }

            trail.advance(CallTreeState::OperationRunning(operation.clone()));
            match stage.execute(cx).await {
                Ok(()) => outcomes.push(StageOutcome::Succeeded { operation }),
                Err(err) => {
                    outcomes.push(StageOutcome::Failed {
                        operation: operation.clone(),
                        error: err.to_string(),
                        root_cause: err.root_cause().kind().to_string(),
                    });
                    failure = Some(OperationError::upstream(operation, err));
                }
            }
        }

        (outcomes, failure)
    }
}
