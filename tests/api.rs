mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::harness;
use hltv_sync::api::{router, AppState};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

async fn call(app: Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_reports_version_and_uptime() {
    let h = harness();
    let (status, body) = call(router(AppState::new(h.ctx.clone())), "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["uptimeSecs"].is_u64());
    assert!(body["startedAt"].is_string());
}

#[tokio::test]
async fn trigger_runs_job_and_reports_records() {
    let h = harness();
    h.serve_all();
    let app = router(AppState::new(h.ctx.clone()));

    let (status, body) = call(app, "POST", "/cron/sync-events").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["job"], "sync-events");
    assert_eq!(body["records"], 2);
    assert_eq!(body["failed"], 0);
}

#[tokio::test]
async fn trigger_passes_event_scope() {
    let h = harness();
    h.serve_all();
    let app = router(AppState::new(h.ctx.clone()));

    call(app.clone(), "POST", "/cron/sync-events").await;
    let event_id = h.event_id(7148);

    let (status, body) = call(app, "POST", &format!("/cron/sync-matches?eventId={event_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["records"], 4);
    assert_eq!(body["failed"], 0);
}

#[tokio::test]
async fn unknown_job_is_not_found() {
    let h = harness();
    let (status, body) = call(router(AppState::new(h.ctx.clone())), "POST", "/cron/sync-everything").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn bad_input_is_bad_request() {
    let h = harness();
    let app = router(AppState::new(h.ctx.clone()));

    let (status, body) = call(app.clone(), "POST", "/cron/clean-matches").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["job"], "clean-matches");
    assert!(body["error"].as_str().unwrap().contains("eventId"));

    let (status, _) = call(app.clone(), "POST", "/cron/sync-matches?eventId=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // neznámý event je chyba vstupu u všech jobů, ne 500
    let (status, body) = call(app, "POST", "/cron/sync-matches?eventId=999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn running_job_is_conflict() {
    let h = harness();
    h.serve_all();
    let _held = h.ctx.locks.try_acquire("sync-news", Duration::from_secs(60)).unwrap();

    let (status, body) = call(router(AppState::new(h.ctx.clone())), "POST", "/cron/sync-news").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn scrape_failure_is_server_error() {
    let h = harness();
    let (status, body) = call(router(AppState::new(h.ctx.clone())), "POST", "/cron/sync-news").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("scrape failed"));
}
