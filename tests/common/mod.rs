//! Shared utilities for call tree and HTTP boundary tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use deadline_trace::call_tree::CallTree;
use deadline_trace::config::{AppConfig, WorkloadConfig, WorkloadKind};
use deadline_trace::observability::{CollectingSink, SpanRecord, Tracer};
use deadline_trace::operations::{standard_pipeline, StandardWorkloads, Workload};

/// Workload that logs each attempt before sleeping for `delay`.
#[allow(dead_code)]
#[derive(Debug)]
pub struct RecordingWorkload {
    name: &'static str,
    delay: Duration,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl Workload for RecordingWorkload {
    fn perform(&self) -> BoxFuture<'static, ()> {
        self.attempts.lock().unwrap().push(self.name.to_string());
        let delay = self.delay;
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        .boxed()
    }
}

/// Standard call tree over recording workloads and a collecting sink.
#[allow(dead_code)]
pub struct Harness {
    pub call_tree: CallTree,
    pub tracer: Tracer,
    pub collector: Arc<CollectingSink>,
    attempts: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Harness {
    /// `delays` are the work durations of auth_inner, auth and query.
    pub fn new(budget: Duration, delays: [Duration; 3]) -> Self {
        let attempts = Arc::new(Mutex::new(Vec::new()));
        let recording = |name, delay| -> Arc<dyn Workload> {
            Arc::new(RecordingWorkload {
                name,
                delay,
                attempts: attempts.clone(),
            })
        };
        let workloads = StandardWorkloads {
            auth_inner: recording("auth_inner", delays[0]),
            auth: recording("auth", delays[1]),
            query: recording("query", delays[2]),
        };

        let collector = Arc::new(CollectingSink::new(256));
        let tracer = Tracer::new("test", collector.clone());
        let call_tree = CallTree::new(tracer.clone(), budget, standard_pipeline(workloads));

        Self {
            call_tree,
            tracer,
            collector,
            attempts,
        }
    }

    /// Names of the operations whose work was attempted, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

/// Look up a record by span name; panics if absent.
#[allow(dead_code)]
pub fn span<'a>(records: &'a [SpanRecord], name: &str) -> &'a SpanRecord {
    records
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no span named {name}"))
}

/// Check the structural invariants every call tree must satisfy.
#[allow(dead_code)]
pub fn assert_tree_invariants(records: &[SpanRecord]) {
    let roots: Vec<_> = records.iter().filter(|r| r.is_root()).collect();
    assert_eq!(roots.len(), 1, "exactly one root span");

    for record in records {
        assert_eq!(record.correlation_id, roots[0].correlation_id);
        assert!(record.start_us <= record.end_us);

        if record.error {
            let detail = record.error_detail.as_ref().expect("erroneous span carries detail");
            assert!(!detail.message.is_empty());
        } else {
            assert!(record.error_detail.is_none());
        }

        if let Some(parent_id) = record.parent_id {
            let parent = records
                .iter()
                .find(|r| r.span_id == parent_id)
                .expect("parent span emitted");
            assert!(parent.start_us <= record.start_us, "child starts after parent");
            assert!(record.end_us <= parent.end_us, "child finishes before parent");
        }
    }

    let mut ids: Vec<_> = records.iter().map(|r| r.span_id).collect();
    ids.sort_by_key(|id| id.to_string());
    ids.dedup();
    assert_eq!(ids.len(), records.len(), "each span emitted once");
}

/// Config whose three workloads all behave the same way.
#[allow(dead_code)]
pub fn uniform_config(budget_ms: u64, kind: WorkloadKind, ceiling_ms: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.deadline.budget_ms = budget_ms;
    config.tracer.log_spans = false;
    let workload = WorkloadConfig { kind, ceiling_ms };
    config.workloads.auth_inner = workload.clone();
    config.workloads.auth = workload.clone();
    config.workloads.query = workload;
    config
}
