/// hltv-sync: Logger
/// JSONL audit stream (jeden soubor na den), run handles pro joby, NTFY push

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Kolik posledních běhů držíme v paměti pro hodinový report
const RUN_HISTORY_CAP: usize = 500;

pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        fs::create_dir_all(&dir).ok();
        Self { log_dir: dir }
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(f, "{line}")?;
        Ok(())
    }

    /// Audit log nesmí shodit job, chyba jen do tracingu
    pub fn log_quiet<T: Serialize>(&self, event: &T) {
        if let Err(e) = self.log(event) {
            tracing::warn!("audit log write failed: {}", e);
        }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.log_dir
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct JobStartedEvent {
    pub ts:       String,
    pub event:    &'static str,   // "JOB_STARTED"
    pub run_id:   u64,
    pub job:      String,
}

#[derive(Serialize, Debug)]
pub struct JobFinishedEvent {
    pub ts:          String,
    pub event:       &'static str,   // "JOB_FINISHED"
    pub run_id:      u64,
    pub job:         String,
    pub status:      &'static str,   // "success" | "partial" | "failed"
    pub records:     usize,
    pub failed:      usize,
    pub message:     Option<String>,
    pub duration_ms: i64,
}

#[derive(Serialize, Debug)]
pub struct RecordFailedEvent {
    pub ts:      String,
    pub event:   &'static str,   // "RECORD_FAILED"
    pub job:     String,
    pub target:  String,         // URL nebo external id
    pub reason:  String,
}

#[derive(Serialize, Debug)]
pub struct ProxyRefreshEvent {
    pub ts:         String,
    pub event:      &'static str,   // "PROXY_REFRESH"
    pub candidates: usize,
    pub replaced:   bool,
}

#[derive(Serialize, Debug, Clone)]
pub struct JobSummary {
    pub job:       String,
    pub runs:      usize,
    pub succeeded: usize,
    pub partial:   usize,
    pub failed:    usize,
    pub records:   usize,
}

#[derive(Serialize, Debug)]
pub struct HourlyReportEvent {
    pub ts:       String,
    pub event:    &'static str,   // "HOURLY_REPORT"
    pub window_from: String,
    pub jobs:     Vec<JobSummary>,
    pub events:   i64,
    pub teams:    i64,
    pub matches:  i64,
    pub live_matches: i64,
}

// ── Run handles ──────────────────────────────────────────────────────────────

/// Handle jednoho běhu jobu, vrací ho `RunLogger::start`
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub run_id:     u64,
    pub job_name:   String,
    pub started_at: DateTime<Utc>,
}

/// Terminální stav běhu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Success { records: usize },
    /// N z M záznamů zapsáno, zbytek selhal
    Partial { written: usize, failed: usize },
    Failed { message: String },
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Success { .. } => "success",
            RunStatus::Partial { .. } => "partial",
            RunStatus::Failed { .. } => "failed",
        }
    }

    pub fn records(&self) -> usize {
        match self {
            RunStatus::Success { records } => *records,
            RunStatus::Partial { written, .. } => *written,
            RunStatus::Failed { .. } => 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub handle:      RunHandle,
    pub finished_at: DateTime<Utc>,
    pub status:      RunStatus,
}

/// Logging kolaborátor pro joby: start → finish, JSONL + tracing + historie
pub struct RunLogger {
    events:  EventLogger,
    next_id: AtomicU64,
    history: Mutex<VecDeque<RunRecord>>,
}

impl RunLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            events:  EventLogger::new(log_dir),
            next_id: AtomicU64::new(1),
            history: Mutex::new(VecDeque::with_capacity(RUN_HISTORY_CAP)),
        }
    }

    pub fn events(&self) -> &EventLogger {
        &self.events
    }

    pub fn start(&self, job_name: &str) -> RunHandle {
        let handle = RunHandle {
            run_id:     self.next_id.fetch_add(1, Ordering::Relaxed),
            job_name:   job_name.to_string(),
            started_at: Utc::now(),
        };

        tracing::info!(run_id = handle.run_id, "▶ {} started", job_name);
        self.events.log_quiet(&JobStartedEvent {
            ts:     handle.started_at.to_rfc3339(),
            event:  "JOB_STARTED",
            run_id: handle.run_id,
            job:    handle.job_name.clone(),
        });
        handle
    }

    pub fn finish(&self, handle: RunHandle, status: RunStatus) -> RunRecord {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - handle.started_at).num_milliseconds();

        let (failed, message) = match &status {
            RunStatus::Success { .. } => (0, None),
            RunStatus::Partial { failed, .. } => (*failed, None),
            RunStatus::Failed { message } => (0, Some(message.clone())),
        };

        match &status {
            RunStatus::Failed { message } => tracing::warn!(
                run_id = handle.run_id, duration_ms, "✖ {} failed: {}", handle.job_name, message
            ),
            other => tracing::info!(
                run_id = handle.run_id, duration_ms, records = other.records(), failed,
                "✔ {} finished ({})", handle.job_name, other.label()
            ),
        }

        self.events.log_quiet(&JobFinishedEvent {
            ts:      finished_at.to_rfc3339(),
            event:   "JOB_FINISHED",
            run_id:  handle.run_id,
            job:     handle.job_name.clone(),
            status:  status.label(),
            records: status.records(),
            failed,
            message,
            duration_ms,
        });

        let record = RunRecord { handle, finished_at, status };
        if let Ok(mut history) = self.history.lock() {
            if history.len() >= RUN_HISTORY_CAP {
                history.pop_front();
            }
            history.push_back(record.clone());
        }
        record
    }

    /// Jednotlivý záznam selhal, batch pokračuje, jen to zapíšeme
    pub fn record_failed(&self, job_name: &str, target: &str, reason: &str) {
        tracing::warn!("{}: record {} failed: {}", job_name, target, reason);
        self.events.log_quiet(&RecordFailedEvent {
            ts:     now_iso(),
            event:  "RECORD_FAILED",
            job:    job_name.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Běhy dokončené po `since`
    pub fn finished_since(&self, since: DateTime<Utc>) -> Vec<RunRecord> {
        match self.history.lock() {
            Ok(history) => history.iter().filter(|r| r.finished_at >= since).cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Souhrn po jobech za poslední okno, seřazený podle jména
    pub fn summarize(&self, window: ChronoDuration) -> Vec<JobSummary> {
        let since = Utc::now() - window;
        let mut out: Vec<JobSummary> = Vec::new();

        for run in self.finished_since(since) {
            let idx = match out.iter().position(|s| s.job == run.handle.job_name) {
                Some(i) => i,
                None => {
                    out.push(JobSummary {
                        job: run.handle.job_name.clone(),
                        runs: 0, succeeded: 0, partial: 0, failed: 0, records: 0,
                    });
                    out.len() - 1
                }
            };
            let entry = &mut out[idx];
            entry.runs += 1;
            entry.records += run.status.records();
            match run.status {
                RunStatus::Success { .. } => entry.succeeded += 1,
                RunStatus::Partial { .. } => entry.partial += 1,
                RunStatus::Failed { .. } => entry.failed += 1,
            }
        }

        out.sort_by(|a, b| a.job.cmp(&b.job));
        out
    }
}

/// Pošli čitelný push alert na ntfy topic
pub async fn send_ntfy_alert(topic: &str, msg: &str, title: &str) {
    let client = reqwest::Client::new();
    match client
        .post(format!("https://ntfy.sh/{topic}"))
        .header("Title", title)
        .header("Priority", "default")
        .header("Tags", "bar_chart")
        .body(msg.to_string())
        .timeout(std::time::Duration::from_secs(10))
        .send()
        .await
    {
        Ok(_)  => tracing::info!("NTFY sent: {}", title),
        Err(e) => tracing::warn!("NTFY failed: {}", e),
    }
}
