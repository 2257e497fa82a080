//! Orchestrator states.
//!
//! ```text
//! Idle → DeadlineEstablished → RootSpanOpen
//!      → OperationRunning(op_1) → ... → OperationRunning(op_n)
//!      → RootSpanClosed → ResponseEmitted
//! ```
//!
//! `ResponseEmitted` is terminal and reached whether or not an operation failed.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "operation", rename_all = "snake_case")]
pub enum CallTreeState {
    Idle,
    DeadlineEstablished,
    RootSpanOpen,
    OperationRunning(String),
    RootSpanClosed,
    ResponseEmitted,
}

impl CallTreeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ResponseEmitted)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(&self, next: &CallTreeState) -> bool {
        use CallTreeState::*;
        matches!(
            (self, next),
            (Idle, DeadlineEstablished)
                | (DeadlineEstablished, RootSpanOpen)
                | (RootSpanOpen, OperationRunning(_))
                | (RootSpanOpen, RootSpanClosed)
                | (OperationRunning(_), OperationRunning(_))
                | (OperationRunning(_), RootSpanClosed)
                | (RootSpanClosed, ResponseEmitted)
        )
    }
}

impl fmt::Display for CallTreeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::DeadlineEstablished => f.write_str("deadline_established"),
            Self::RootSpanOpen => f.write_str("root_span_open"),
            Self::OperationRunning(op) => write!(f, "operation_running({op})"),
            Self::RootSpanClosed => f.write_str("root_span_closed"),
            Self::ResponseEmitted => f.write_str("response_emitted"),
        }
    }
}

/// Ordered record of the states one call tree passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTrail {
    states: Vec<CallTreeState>,
}

impl StateTrail {
    pub fn new() -> Self {
        Self {
            states: vec![CallTreeState::Idle],
        }
    }

    pub fn current(&self) -> &CallTreeState {
        // Never empty: starts at Idle.
        &self.states[self.states.len() - 1]
    }

    /// Move to `next`. Illegal transitions are logged and still recorded.
    pub fn advance(&mut self, next: CallTreeState) {
        if !self.current().can_advance_to(&next) {
            tracing::error!(from = %self.current(), to = %next, "Illegal call tree transition");
        }
        tracing::trace!(state = %next, "Call tree state");
        self.states.push(next);
    }

    pub fn states(&self) -> &[CallTreeState] {
        &self.states
    }
}

impl Default for StateTrail {
    fn default() -> Self {
        Self::new()
    }
}
