//! Traced, deadline-bounded operations.
//!
//! # Responsibilities
//! - Open one child span per invocation
//! - Run prerequisites first, failing fast on the first failure
//! - Race the operation's own work against the deadline
//! - Record every failure on the operation's span before it finishes
//!
//! # Design Decisions
//! - Single attempt: work is not assumed idempotent
//! - A prerequisite failure is wrapped, so its root kind stays visible
//! - The span is finished explicitly once the outcome is known; if the
//!   future is dropped first, `Drop` finishes it as cancelled

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tracing::Instrument;

use crate::observability::span::Span;
use crate::operations::context::CallContext;
use crate::operations::error::OperationError;
use crate::operations::workload::Workload;
use crate::resilience::timeouts::await_either;

pub struct Operation {
    name: String,
    workload: Arc<dyn Workload>,
    prerequisites: Vec<Arc<Operation>>,
}

impl Operation {
    pub fn new(name: impl Into<String>, workload: Arc<dyn Workload>) -> Self {
        Self {
            name: name.into(),
            workload,
            prerequisites: Vec::new(),
        }
    }

    /// Run `prerequisite` before this operation's own work.
    pub fn with_prerequisite(mut self, prerequisite: Arc<Operation>) -> Self {
        self.prerequisites.push(prerequisite);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prerequisites(&self) -> &[Arc<Operation>] {
        &self.prerequisites
    }

    /// Execute under the caller's span and deadline.
    pub fn execute<'a>(&'a self, cx: &'a CallContext) -> BoxFuture<'a, Result<(), OperationError>> {
        Box::pin(async move {
            let mut span = Span::start_child(cx.span(), self.name.clone());
            let child_cx = cx.child(&span);

            let result = self
                .run(&child_cx)
                .instrument(span.tracing_span().clone())
                .await;

            if let Err(err) = &result {
                if let Err(span_err) = span.record_error(err) {
                    tracing::error!(operation = %self.name, error = %span_err, "Failed to record error on span");
                }
            }
            if let Err(span_err) = span.finish() {
                tracing::error!(operation = %self.name, error = %span_err, "Span finished twice");
            }
            result
        })
    }

    async fn run(&self, cx: &CallContext) -> Result<(), OperationError> {
        for prerequisite in &self.prerequisites {
            if let Err(cause) = prerequisite.execute(cx).await {
                tracing::warn!(
                    operation = %self.name,
                    prerequisite = %prerequisite.name(),
                    error = %cause,
                    "Prerequisite failed, skipping work"
                );
                return Err(OperationError::upstream(prerequisite.name(), cause));
            }
        }

        tracing::debug!(
            operation = %self.name,
            remaining_ms = cx.deadline().remaining().as_millis() as u64,
            "Starting work"
        );

        match await_either(cx.deadline(), self.workload.perform()).await {
            Ok(()) => {
                tracing::debug!(operation = %self.name, "Work completed");
                Ok(())
            }
            Err(reason) => {
                tracing::warn!(operation = %self.name, reason = %reason, "Work abandoned");
                Err(reason.into())
            }
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("workload", &self.workload)
            .field(
                "prerequisites",
                &self.prerequisites.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
