//! Tracer provider.
//!
//! # Responsibilities
//! - Open root spans, one correlation id per call tree
//! - Own the sink every span of its trees reports to
//! - Count started/finished spans
//!
//! # Design Decisions
//! - Constructed explicitly and handed to whoever opens root spans;
//!   there is no process-wide tracer
//! - Cloning shares the sink and counters

use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::time::Instant;

use crate::observability::sink::SpanSink;
use crate::observability::span::{Span, SpanCounters, TreeShared};

/// Snapshot of a tracer's span counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TracerStats {
    pub started: u64,
    pub finished: u64,
}

impl TracerStats {
    /// Spans started but not finished yet.
    pub fn open(&self) -> u64 {
        self.started.saturating_sub(self.finished)
    }
}

#[derive(Clone)]
pub struct Tracer {
    service: Arc<str>,
    sink: Arc<dyn SpanSink>,
    counters: Arc<SpanCounters>,
}

impl Tracer {
    pub fn new(service: impl Into<String>, sink: Arc<dyn SpanSink>) -> Self {
        Self {
            service: Arc::from(service.into()),
            sink,
            counters: Arc::new(SpanCounters::default()),
        }
    }

    /// Open the root span of a new call tree.
    pub fn start_root(&self, name: impl Into<Cow<'static, str>>) -> Span {
        let tree = TreeShared {
            anchor: Instant::now(),
            service: self.service.clone(),
            sink: self.sink.clone(),
            counters: self.counters.clone(),
        };
        Span::root(tree, name)
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    pub fn stats(&self) -> TracerStats {
        TracerStats {
            started: self.counters.started.load(Ordering::Relaxed),
            finished: self.counters.finished.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("service", &self.service)
            .field("stats", &self.stats())
            .finish()
    }
}
