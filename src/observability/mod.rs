//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Tracer (tracer.rs)
//!     → start_root: one correlation id per call tree
//!     → Span::start_child per nested operation (span.rs)
//!     → finish / Drop emits SpanRecord exactly once
//!
//! Sinks (sink.rs):
//!     → CollectingSink (recent call trees, served on /traces)
//!     → LogSink (structured log line per span, logging.rs subscriber)
//!     → MetricsSink (metrics.rs counters and histograms)
//! ```
//!
//! # Design Decisions
//! - No global tracer; the provider is injected where root spans open
//! - Correlation id flows through every span of a call tree
//! - Metrics are cheap (no-ops without a recorder)

pub mod logging;
pub mod metrics;
pub mod sink;
pub mod span;
pub mod tracer;

pub use sink::{CollectingSink, FanoutSink, LogSink, MetricsSink, SpanSink, TraceSummary};
pub use span::{
    CorrelationId, ErrorDetail, Span, SpanError, SpanHandle, SpanId, SpanRecord,
    ABANDONED_KIND,
};
pub use tracer::{Tracer, TracerStats};
