//! HLTV sync engine: sync joby nad kanonickou DB, scheduler a trigger API.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod locks;
pub mod scheduler;

pub use config::SyncConfig;
pub use error::JobError;
pub use jobs::{run_job, Job, JobContext, JobOutcome, JobScope};
