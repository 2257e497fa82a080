//! Per-call propagation context.

use crate::observability::span::{Span, SpanHandle};
use crate::resilience::deadline::DeadlineContext;

/// What a caller hands to a callee: the deadline and the caller's span.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: DeadlineContext,
    span: SpanHandle,
}

impl CallContext {
    pub fn new(deadline: DeadlineContext, span: SpanHandle) -> Self {
        Self { deadline, span }
    }

    pub fn deadline(&self) -> &DeadlineContext {
        &self.deadline
    }

    /// Span of the operation holding this context.
    pub fn span(&self) -> &SpanHandle {
        &self.span
    }

    /// Context for work nested under `span`.
    pub fn child(&self, span: &Span) -> Self {
        Self {
            deadline: self.deadline.derive(),
            span: span.handle().clone(),
        }
    }
}
