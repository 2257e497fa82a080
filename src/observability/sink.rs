//! Destinations for finished spans.
//!
//! # Responsibilities
//! - Accept each finished [`SpanRecord`] exactly once
//! - Keep recent call trees for inspection ([`CollectingSink`])
//! - Log and count spans ([`LogSink`], [`MetricsSink`])
//!
//! # Design Decisions
//! - Emission is synchronous and append-only; sinks never call back into spans
//! - Sinks tolerate concurrent emission from independent call trees
//! - No ordering across call trees; within one tree children may arrive
//!   before their parent

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::Serialize;

use crate::observability::metrics;
use crate::observability::span::{CorrelationId, SpanRecord};

/// Receiver of finished spans.
pub trait SpanSink: Send + Sync {
    fn emit(&self, record: SpanRecord);
}

/// Per-tree overview returned by [`CollectingSink::summaries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub correlation_id: CorrelationId,
    pub spans: usize,
    pub errors: usize,
    pub root: Option<String>,
}

/// In-memory sink grouping records by correlation id.
///
/// Keeps at most `retain` completed call trees; the oldest is evicted
/// first. A tree counts as completed once its root record arrives, so
/// trees still in flight are never evicted.
pub struct CollectingSink {
    traces: DashMap<CorrelationId, Vec<SpanRecord>>,
    order: Mutex<VecDeque<CorrelationId>>,
    retain: usize,
    emitted: AtomicU64,
}

impl CollectingSink {
    pub fn new(retain: usize) -> Self {
        Self {
            traces: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            retain: retain.max(1),
            emitted: AtomicU64::new(0),
        }
    }

    /// Records of one call tree, in emission order.
    pub fn trace(&self, correlation_id: &CorrelationId) -> Option<Vec<SpanRecord>> {
        self.traces.get(correlation_id).map(|records| records.value().clone())
    }

    /// Completed call trees, most recently completed first.
    pub fn summaries(&self) -> Vec<TraceSummary> {
        let order = self.order.lock().unwrap_or_else(|e| e.into_inner()).clone();
        order
            .iter()
            .rev()
            .filter_map(|id| {
                self.traces.get(id).map(|records| TraceSummary {
                    correlation_id: *id,
                    spans: records.len(),
                    errors: records.iter().filter(|r| r.error).count(),
                    root: records.iter().find(|r| r.is_root()).map(|r| r.name.clone()),
                })
            })
            .collect()
    }

    /// Number of retained call trees, in-flight ones included.
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    /// Total records ever received, including evicted ones.
    pub fn emitted(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }
}

impl SpanSink for CollectingSink {
    fn emit(&self, record: SpanRecord) {
        self.emitted.fetch_add(1, Ordering::Relaxed);
        let correlation_id = record.correlation_id;
        let completes_tree = record.is_root();

        self.traces.entry(correlation_id).or_default().push(record);
        if !completes_tree {
            return;
        }

        // The root finishes last, so only completed trees are queued for
        // eviction. Pop and remove happen under one lock.
        let mut order = self.order.lock().unwrap_or_else(|e| e.into_inner());
        order.push_back(correlation_id);
        while order.len() > self.retain {
            if let Some(oldest) = order.pop_front() {
                self.traces.remove(&oldest);
                tracing::trace!(correlation_id = %oldest, "Evicted call tree");
            }
        }
    }
}

/// Logs every finished span; erroneous spans at `warn`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SpanSink for LogSink {
    fn emit(&self, record: SpanRecord) {
        let duration_ms = record.duration().as_secs_f64() * 1000.0;
        match &record.error_detail {
            Some(detail) => tracing::warn!(
                service = %record.service,
                span = %record.name,
                correlation_id = %record.correlation_id,
                span_id = %record.span_id,
                parent_id = ?record.parent_id.map(|id| id.to_string()),
                duration_ms,
                error.kind = %detail.kind,
                error.message = %detail.message,
                "Span finished with error"
            ),
            None => tracing::info!(
                service = %record.service,
                span = %record.name,
                correlation_id = %record.correlation_id,
                span_id = %record.span_id,
                parent_id = ?record.parent_id.map(|id| id.to_string()),
                duration_ms,
                "Span finished"
            ),
        }
    }
}

/// Feeds span counters and durations into the metrics recorder.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsSink;

impl SpanSink for MetricsSink {
    fn emit(&self, record: SpanRecord) {
        metrics::record_span(&record);
    }
}

/// Forwards every record to each inner sink in order.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn SpanSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn SpanSink>>) -> Self {
        Self { sinks }
    }
}

impl SpanSink for FanoutSink {
    fn emit(&self, record: SpanRecord) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.emit(record.clone());
            }
            last.emit(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    use crate::observability::span::SpanId;

    fn record(correlation_id: CorrelationId, name: &str) -> SpanRecord {
        SpanRecord {
            service: "test".into(),
            name: name.into(),
            span_id: SpanId::generate(),
            correlation_id,
            parent_id: None,
            start_us: 0,
            end_us: 10,
            error: false,
            error_detail: None,
            started_at: SystemTime::now(),
        }
    }

    fn child(correlation_id: CorrelationId, name: &str) -> SpanRecord {
        SpanRecord {
            parent_id: Some(SpanId::generate()),
            ..record(correlation_id, name)
        }
    }

    fn names(sink: &CollectingSink, id: &CorrelationId) -> Option<Vec<String>> {
        sink.trace(id)
            .map(|records| records.into_iter().map(|r| r.name).collect())
    }

    #[test]
    fn test_collecting_sink_groups_by_tree() {
        let sink = CollectingSink::new(8);
        let a = CorrelationId::new();
        let b = CorrelationId::new();

        sink.emit(child(a, "auth"));
        sink.emit(record(b, "request"));
        sink.emit(record(a, "request"));

        assert_eq!(sink.trace(&a).unwrap().len(), 2);
        assert_eq!(sink.trace(&b).unwrap().len(), 1);
        assert_eq!(sink.emitted(), 3);

        let summaries = sink.summaries();
        assert_eq!(summaries[0].correlation_id, a);
        assert_eq!(summaries[0].spans, 2);
        assert_eq!(summaries[1].correlation_id, b);
    }

    #[test]
    fn test_collecting_sink_evicts_oldest() {
        let sink = CollectingSink::new(2);
        let ids: Vec<_> = (0..3).map(|_| CorrelationId::new()).collect();
        for id in &ids {
            sink.emit(record(*id, "request"));
        }

        assert_eq!(sink.len(), 2);
        assert!(sink.trace(&ids[0]).is_none());
        assert!(sink.trace(&ids[2]).is_some());
        assert_eq!(sink.emitted(), 3);
    }

    #[test]
    fn test_interleaved_trees_are_kept_whole() {
        let sink = CollectingSink::new(1);
        let a = CorrelationId::new();
        let b = CorrelationId::new();

        sink.emit(child(a, "auth"));
        sink.emit(child(b, "auth"));
        sink.emit(record(a, "request"));

        // `b` is still in flight; it stays although retention is full.
        assert_eq!(names(&sink, &a).unwrap(), ["auth", "request"]);
        assert_eq!(names(&sink, &b).unwrap(), ["auth"]);

        sink.emit(record(b, "request"));
        assert_eq!(names(&sink, &a), None);
        assert_eq!(names(&sink, &b).unwrap(), ["auth", "request"]);
        assert_eq!(sink.summaries().len(), 1);
    }

    #[test]
    fn test_in_flight_tree_outlives_completed_ones() {
        let sink = CollectingSink::new(1);
        let slow = CorrelationId::new();
        sink.emit(child(slow, "auth_inner"));

        let quick: Vec<_> = (0..3).map(|_| CorrelationId::new()).collect();
        for id in &quick {
            sink.emit(child(*id, "auth"));
            sink.emit(record(*id, "request"));
        }
        assert_eq!(names(&sink, &slow).unwrap(), ["auth_inner"]);
        assert_eq!(sink.len(), 2);

        sink.emit(child(slow, "auth"));
        sink.emit(record(slow, "request"));
        assert_eq!(names(&sink, &slow).unwrap(), ["auth_inner", "auth", "request"]);
        assert!(quick.iter().all(|id| sink.trace(id).is_none()));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_emission_from_many_trees() {
        let sink = Arc::new(CollectingSink::new(4));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let sink = sink.clone();
            handles.push(tokio::spawn(async move {
                let id = CorrelationId::new();
                for _ in 0..24 {
                    sink.emit(child(id, "op"));
                    tokio::task::yield_now().await;
                }
                sink.emit(record(id, "request"));
                id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        assert_eq!(sink.emitted(), 16 * 25);
        assert_eq!(sink.len(), 4);

        // Whatever survived eviction is complete.
        let kept: Vec<_> = ids.iter().filter_map(|id| sink.trace(id)).collect();
        assert_eq!(kept.len(), 4);
        for records in kept {
            assert_eq!(records.len(), 25);
            assert!(records.last().unwrap().is_root());
        }
    }

    #[test]
    fn test_fanout_delivers_to_every_sink() {
        let first = Arc::new(CollectingSink::new(4));
        let second = Arc::new(CollectingSink::new(4));
        let fanout = FanoutSink::new(vec![
            first.clone() as Arc<dyn SpanSink>,
            second.clone(),
            Arc::new(LogSink),
        ]);

        let id = CorrelationId::new();
        fanout.emit(record(id, "request"));

        assert_eq!(first.trace(&id).unwrap().len(), 1);
        assert_eq!(second.trace(&id).unwrap().len(), 1);
    }
}
