//! Chyby jobů a jejich JSON podoba pro trigger API.
//!
//! | Varianta       | HTTP |
//! |----------------|------|
//! | `Busy`         | 409  |
//! | `InvalidInput` | 400  |
//! | ostatní        | 500  |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canon_db::StoreError;
use hltv_scraper::ScrapeError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("scrape failed: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("store failed: {0}")]
    Store(#[from] StoreError),

    /// Lease jobu drží jiný běh
    #[error("job {0} is already running")]
    Busy(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Busy(_) => StatusCode::CONFLICT,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Scrape(_) | Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub job: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriggerResponse {
    pub fn ok(job: &str, records: usize, failed: usize) -> Self {
        Self { success: true, job: job.to_string(), records: Some(records), failed: Some(failed), error: None }
    }

    pub fn err(job: &str, message: String) -> Self {
        Self { success: false, job: job.to_string(), records: None, failed: None, error: Some(message) }
    }
}

/// Chyba jobu i se jménem jobu, pro HTTP odpověď
#[derive(Debug)]
pub struct JobFailure {
    pub job: String,
    pub error: JobError,
}

impl IntoResponse for JobFailure {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        let mut response = Json(TriggerResponse::err(&self.job, self.error.to_string())).into_response();
        *response.status_mut() = status;
        response
    }
}
