//! Trigger API: `GET /health` a `POST /cron/{job}` pro každý job.

use crate::error::{JobError, JobFailure, TriggerResponse};
use crate::jobs::{run_job, Job, JobContext, JobScope};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub ctx: JobContext,
    pub started_at: DateTime<Utc>,
    pub started: Instant,
}

impl AppState {
    pub fn new(ctx: JobContext) -> Self {
        Self { ctx, started_at: Utc::now(), started: Instant::now() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    started_at: String,
    version: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/cron/{job}", post(trigger_handler))
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy",
            uptime_secs: state.started.elapsed().as_secs(),
            started_at: state.started_at.to_rfc3339(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

async fn trigger_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    scope: Result<Query<JobScope>, QueryRejection>,
) -> Response {
    let Some(job) = Job::from_name(&name) else {
        let body = TriggerResponse::err(&name, format!("unknown job {name}"));
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    };

    let scope = match scope {
        Ok(Query(scope)) => scope,
        Err(rejection) => {
            let error = JobError::InvalidInput(rejection.body_text());
            return JobFailure { job: name, error }.into_response();
        }
    };

    info!("🔔 Manual trigger {} {:?}", job.name(), scope);
    match run_job(&state.ctx, job, scope).await {
        Ok(outcome) => Json(TriggerResponse::ok(job.name(), outcome.written, outcome.failed)).into_response(),
        Err(error) => JobFailure { job: job.name().to_string(), error }.into_response(),
    }
}
