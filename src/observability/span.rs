//! Spans: timed, named units of observability.
//!
//! # Responsibilities
//! - Stamp start/end offsets on one call tree's clock
//! - Link every child to its parent by id (no ownership between spans)
//! - Carry the error flag and structured error detail
//! - Emit exactly one [`SpanRecord`] per span to the sink
//!
//! # Design Decisions
//! - A [`Span`] is owned by the operation that opened it and finished by
//!   it; `Drop` finishes an abandoned span and marks it cancelled, so
//!   every exit path emits the record and none reads as a silent success
//! - Offsets come from a monotonic clock anchored at the root span, so
//!   parent/child start ordering cannot go backwards
//! - Each span mirrors itself as a `tracing::Span` for log nesting

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::observability::sink::SpanSink;

/// Identifier of one span, unique within a call tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpanId(u64);

impl SpanId {
    pub(crate) fn generate() -> Self {
        Self(fastrand::u64(1..))
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Identifier shared by every span of one call tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for CorrelationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Structured failure attached to an erroneous span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable kind, e.g. `deadline_exceeded`.
    pub kind: String,
    /// Human-readable message. Never empty on a recorded span.
    pub message: String,
    /// Kind of the innermost failure when this one wraps another.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    /// Operation whose failure caused this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_operation: Option<String>,
}

impl ErrorDetail {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            root_cause: None,
            cause_operation: None,
        }
    }
}

/// Finished span as delivered to a [`SpanSink`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanRecord {
    pub service: String,
    pub name: String,
    pub span_id: SpanId,
    pub correlation_id: CorrelationId,
    pub parent_id: Option<SpanId>,
    /// Microseconds since the root span started.
    pub start_us: u64,
    /// Microseconds since the root span started.
    pub end_us: u64,
    pub error: bool,
    pub error_detail: Option<ErrorDetail>,
    pub started_at: SystemTime,
}

impl SpanRecord {
    pub fn duration(&self) -> Duration {
        Duration::from_micros(self.end_us.saturating_sub(self.start_us))
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Misuse of a span's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanError {
    #[error("span `{0}` is already finished")]
    AlreadyFinished(String),
    #[error("span `{0}` cannot record an error without detail")]
    EmptyErrorDetail(String),
}

/// Started/finished span counters of one tracer.
#[derive(Debug, Default)]
pub(crate) struct SpanCounters {
    pub(crate) started: AtomicU64,
    pub(crate) finished: AtomicU64,
}

/// State shared by every span of one call tree.
pub(crate) struct TreeShared {
    pub(crate) anchor: Instant,
    pub(crate) service: Arc<str>,
    pub(crate) sink: Arc<dyn SpanSink>,
    pub(crate) counters: Arc<SpanCounters>,
}

/// Lookup-only reference to a span, passed down to callees.
///
/// Holding a handle does not keep the span open and grants no mutation.
#[derive(Clone)]
pub struct SpanHandle {
    id: SpanId,
    correlation_id: CorrelationId,
    tree: Arc<TreeShared>,
    tracing_span: tracing::Span,
}

impl SpanHandle {
    pub fn id(&self) -> SpanId {
        self.id
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn tracing_span(&self) -> &tracing::Span {
        &self.tracing_span
    }
}

impl fmt::Debug for SpanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpanHandle")
            .field("id", &self.id)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}

/// An open span, owned by the operation that started it.
pub struct Span {
    handle: SpanHandle,
    name: Cow<'static, str>,
    parent_id: Option<SpanId>,
    start: Duration,
    end: Option<Duration>,
    error: Option<ErrorDetail>,
    started_at: SystemTime,
}

impl Span {
    pub(crate) fn root(tree: TreeShared, name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let id = SpanId::generate();
        let correlation_id = CorrelationId::new();
        let tracing_span = tracing::info_span!(
            "span",
            operation = %name,
            correlation_id = %correlation_id,
            span_id = %id,
            error = tracing::field::Empty,
            error.detail = tracing::field::Empty,
        );
        tree.counters.started.fetch_add(1, Ordering::Relaxed);

        Self {
            handle: SpanHandle {
                id,
                correlation_id,
                tree: Arc::new(tree),
                tracing_span,
            },
            name,
            parent_id: None,
            start: Duration::ZERO,
            end: None,
            error: None,
            started_at: SystemTime::now(),
        }
    }

    /// Open a span nested under `parent`.
    pub fn start_child(parent: &SpanHandle, name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let id = SpanId::generate();
        let tracing_span = tracing::info_span!(
            parent: &parent.tracing_span,
            "span",
            operation = %name,
            span_id = %id,
            parent_id = %parent.id,
            error = tracing::field::Empty,
            error.detail = tracing::field::Empty,
        );
        let tree = parent.tree.clone();
        tree.counters.started.fetch_add(1, Ordering::Relaxed);
        let start = tree.anchor.elapsed();

        Self {
            handle: SpanHandle {
                id,
                correlation_id: parent.correlation_id,
                tree,
                tracing_span,
            },
            name,
            parent_id: Some(parent.id),
            start,
            end: None,
            error: None,
            started_at: SystemTime::now(),
        }
    }

    pub fn handle(&self) -> &SpanHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> SpanId {
        self.handle.id
    }

    pub fn parent_id(&self) -> Option<SpanId> {
        self.parent_id
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.handle.correlation_id
    }

    pub fn tracing_span(&self) -> &tracing::Span {
        &self.handle.tracing_span
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_detail(&self) -> Option<&ErrorDetail> {
        self.error.as_ref()
    }

    /// Mark the span erroneous. A later call replaces the detail.
    pub fn record_error(&mut self, detail: impl Into<ErrorDetail>) -> Result<(), SpanError> {
        if self.is_finished() {
            return Err(SpanError::AlreadyFinished(self.name.to_string()));
        }
        let detail = detail.into();
        if detail.message.is_empty() {
            return Err(SpanError::EmptyErrorDetail(self.name.to_string()));
        }

        self.handle.tracing_span.record("error", true);
        self.handle
            .tracing_span
            .record("error.detail", detail.message.as_str());
        self.error = Some(detail);
        Ok(())
    }

    /// Stamp the end offset and emit the record. Only the first call counts.
    pub fn finish(&mut self) -> Result<(), SpanError> {
        if self.is_finished() {
            return Err(SpanError::AlreadyFinished(self.name.to_string()));
        }

        let tree = &self.handle.tree;
        let end = tree.anchor.elapsed().max(self.start);
        self.end = Some(end);
        tree.counters.finished.fetch_add(1, Ordering::Relaxed);

        let record = SpanRecord {
            service: tree.service.to_string(),
            name: self.name.to_string(),
            span_id: self.handle.id,
            correlation_id: self.handle.correlation_id,
            parent_id: self.parent_id,
            start_us: self.start.as_micros() as u64,
            end_us: end.as_micros() as u64,
            error: self.error.is_some(),
            error_detail: self.error.clone(),
            started_at: self.started_at,
        };
        tree.sink.emit(record);
        Ok(())
    }
}

/// Kind recorded on a span that was dropped without being finished.
pub const ABANDONED_KIND: &str = "cancelled";

impl Drop for Span {
    /// Every normal exit finishes explicitly, so reaching here unfinished
    /// means the owning future was dropped mid-operation.
    fn drop(&mut self) {
        if self.is_finished() {
            return;
        }
        if self.error.is_none() {
            let detail = ErrorDetail::new(ABANDONED_KIND, "span dropped before it finished");
            let _ = self.record_error(detail);
        }
        tracing::debug!(span = %self.name, span_id = %self.handle.id, "Span abandoned");
        let _ = self.finish();
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("name", &self.name)
            .field("id", &self.handle.id)
            .field("parent_id", &self.parent_id)
            .field("correlation_id", &self.handle.correlation_id)
            .field("finished", &self.is_finished())
            .field("error", &self.error)
            .finish()
    }
}
