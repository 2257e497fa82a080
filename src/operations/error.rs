//! Operation failure taxonomy.

use crate::observability::span::ErrorDetail;
use crate::resilience::deadline::DoneReason;

/// Why an operation did not complete its unit of work.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationError {
    /// The shared budget expired before the work completed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The call tree was cancelled before the work completed.
    #[error("context cancelled")]
    Cancelled,

    /// A prerequisite operation failed; the dependent work never started.
    #[error("upstream `{operation}` failed: {cause}")]
    UpstreamFailure {
        operation: String,
        #[source]
        cause: Box<OperationError>,
    },
}

impl OperationError {
    pub fn upstream(operation: impl Into<String>, cause: OperationError) -> Self {
        Self::UpstreamFailure {
            operation: operation.into(),
            cause: Box::new(cause),
        }
    }

    /// The failure that started the chain.
    pub fn root_cause(&self) -> &OperationError {
        let mut current = self;
        while let Self::UpstreamFailure { cause, .. } = current {
            current = cause;
        }
        current
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self.root_cause(), Self::DeadlineExceeded)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Cancelled => "cancelled",
            Self::UpstreamFailure { .. } => "upstream_failure",
        }
    }
}

impl From<DoneReason> for OperationError {
    fn from(reason: DoneReason) -> Self {
        match reason {
            DoneReason::Expired => Self::DeadlineExceeded,
            DoneReason::Cancelled => Self::Cancelled,
        }
    }
}

impl From<&OperationError> for ErrorDetail {
    fn from(err: &OperationError) -> Self {
        let mut detail = ErrorDetail::new(err.kind(), err.to_string());
        if let OperationError::UpstreamFailure { operation, .. } = err {
            detail.cause_operation = Some(operation.clone());
            detail.root_cause = Some(err.root_cause().kind().to_string());
        }
        detail
    }
}
