//! Request boundary: routing, headers and trace inspection.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;

use deadline_trace::config::WorkloadKind;
use deadline_trace::lifecycle::{build_app, Shutdown};

mod common;
use common::uniform_config;

fn router(budget_ms: u64, kind: WorkloadKind, ceiling_ms: u64) -> Router {
    build_app(uniform_config(budget_ms, kind, ceiling_ms))
        .unwrap()
        .server
        .router()
}

async fn get(router: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_request_answers_hello_and_exposes_its_trace() {
    let router = router(2000, WorkloadKind::Immediate, 0);

    let (status, headers, body) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hello\n");
    assert!(headers.contains_key("x-request-id"));
    let correlation_id = headers["x-correlation-id"].to_str().unwrap().to_string();

    let (status, _, body) = get(&router, &format!("/traces/{correlation_id}")).await;
    assert_eq!(status, StatusCode::OK);
    let records: serde_json::Value = serde_json::from_str(&body).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert!(records.iter().all(|r| r["correlation_id"] == correlation_id));
    assert!(records.iter().all(|r| r["error"] == false));
}

#[tokio::test]
async fn test_any_path_runs_a_call_tree() {
    let router = router(2000, WorkloadKind::Immediate, 0);

    let response = router
        .clone()
        .oneshot(
            Request::post("/some/nested/path")
                .header("x-request-id", "caller-supplied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "caller-supplied");
    assert!(response.headers().contains_key("x-correlation-id"));
}

#[tokio::test]
async fn test_deadline_failure_still_answers_ok() {
    let router = router(20, WorkloadKind::Fixed, 200);

    let (status, headers, body) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hello\n");

    let correlation_id = headers["x-correlation-id"].to_str().unwrap().to_string();
    let (_, _, body) = get(&router, &format!("/traces/{correlation_id}")).await;
    let records: serde_json::Value = serde_json::from_str(&body).unwrap();
    let records = records.as_array().unwrap();

    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r["error"] == true));
    let root = records.iter().find(|r| r["name"] == "request").unwrap();
    assert_eq!(root["error_detail"]["root_cause"], "deadline_exceeded");
}

#[tokio::test]
async fn test_trace_lookup_errors() {
    let router = router(2000, WorkloadKind::Immediate, 0);

    let (status, _, _) = get(&router, "/traces/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unknown = uuid::Uuid::new_v4();
    let (status, _, _) = get(&router, &format!("/traces/{unknown}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_trace_listing_and_health() {
    let router = router(2000, WorkloadKind::Immediate, 0);
    for _ in 0..3 {
        get(&router, "/").await;
    }

    let (status, _, body) = get(&router, "/traces").await;
    assert_eq!(status, StatusCode::OK);
    let summaries: serde_json::Value = serde_json::from_str(&body).unwrap();
    let summaries = summaries.as_array().unwrap();
    assert_eq!(summaries.len(), 3);
    for summary in summaries {
        assert_eq!(summary["spans"], 4);
        assert_eq!(summary["errors"], 0);
        assert_eq!(summary["root"], "request");
    }

    let (status, _, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_server_drains_on_shutdown() {
    let app = build_app(uniform_config(2000, WorkloadKind::Immediate, 0)).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = tokio::spawn(app.server.run(listener, shutdown.subscribe()));

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.headers().contains_key("x-correlation-id"));
    assert_eq!(response.text().await.unwrap(), "hello\n");

    shutdown.trigger();
    server.await.unwrap().unwrap();
    assert_eq!(app.tracer.stats().open(), 0);
    assert_eq!(app.collector.len(), 1);
}
