//! Sync joby, kalkulace a údržba; všechno běží přes `run_job`:
//! lease → `RunLogger::start` → job → `RunLogger::finish`.
//!
//! Chyba jednoho záznamu (nebo jednoho targetu) batch neshodí: zapíše se
//! `RECORD_FAILED`, zvedne se `failed` a jede se dál.

mod clean;
mod events;
pub mod maintenance;
mod matches;
mod news;
mod participants;
mod report;
mod stats;
mod swiss;

use crate::config::SyncConfig;
use crate::error::JobError;
use crate::locks::JobLocks;
use canon_db::{Event, Store, StoreError};
use chrono::Utc;
use hltv_scraper::{scrape_blocking, Extracted, HltvPages, PageSource, RecordSpec, RetryPolicy, ScrapeError};
use logger::{RunLogger, RunStatus};
use proxy_pool::ProxyPool;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

// ── Job katalog ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    SyncEvents,
    SyncParticipants,
    SyncMatches,
    SyncNews,
    SyncSwiss,
    CalculateStats,
    CalculateH2h,
    FixStatus,
    HourlyReport,
    CleanMatches,
}

impl Job {
    pub const ALL: [Job; 10] = [
        Job::SyncEvents,
        Job::SyncParticipants,
        Job::SyncMatches,
        Job::SyncNews,
        Job::SyncSwiss,
        Job::CalculateStats,
        Job::CalculateH2h,
        Job::FixStatus,
        Job::HourlyReport,
        Job::CleanMatches,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Job::SyncEvents => "sync-events",
            Job::SyncParticipants => "sync-participants",
            Job::SyncMatches => "sync-matches",
            Job::SyncNews => "sync-news",
            Job::SyncSwiss => "sync-swiss",
            Job::CalculateStats => "calculate-stats",
            Job::CalculateH2h => "calculate-h2h",
            Job::FixStatus => "fix-status",
            Job::HourlyReport => "hourly-report",
            Job::CleanMatches => "clean-matches",
        }
    }

    pub fn from_name(name: &str) -> Option<Job> {
        Job::ALL.into_iter().find(|j| j.name() == name)
    }

    /// Jak dlouho smí běh držet lease, než ho převezme další
    pub fn lease_ttl(&self) -> Duration {
        match self {
            Job::SyncEvents | Job::SyncParticipants | Job::SyncMatches | Job::SyncNews | Job::SyncSwiss => {
                Duration::from_secs(2 * 3600)
            }
            _ => Duration::from_secs(15 * 60),
        }
    }
}

/// Volitelné zúžení jobu (query parametry triggeru)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobScope {
    #[serde(default)]
    pub championship: bool,
    /// Kanonické id eventu
    pub event_id: Option<i64>,
}

impl JobScope {
    pub fn event(event_id: i64) -> Self {
        Self { championship: false, event_id: Some(event_id) }
    }

    pub fn championship() -> Self {
        Self { championship: true, event_id: None }
    }
}

/// N zapsaných z M; `failed > 0` je partial success, ne chyba
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOutcome {
    pub written: usize,
    pub failed: usize,
}

impl JobOutcome {
    pub fn merge(&mut self, other: JobOutcome) {
        self.written += other.written;
        self.failed += other.failed;
    }

    fn status(&self) -> RunStatus {
        if self.failed == 0 {
            RunStatus::Success { records: self.written }
        } else {
            RunStatus::Partial { written: self.written, failed: self.failed }
        }
    }
}

// ── Kontext ──────────────────────────────────────────────────────────────────

/// Všechno, co job potřebuje; žádné globální singletony
#[derive(Clone)]
pub struct JobContext {
    pub store: Store,
    pub source: Arc<dyn PageSource>,
    pub pages: HltvPages,
    pub proxies: Arc<ProxyPool>,
    pub runs: Arc<RunLogger>,
    pub locks: JobLocks,
    pub retry: RetryPolicy,
    pub championship_event_id: Option<i64>,
    pub ntfy_topic: Option<String>,
}

impl JobContext {
    pub fn new(
        config: &SyncConfig,
        store: Store,
        source: Arc<dyn PageSource>,
        proxies: Arc<ProxyPool>,
        runs: Arc<RunLogger>,
    ) -> Self {
        Self {
            store,
            source,
            pages: HltvPages::new(config.scrape_base_url.clone()),
            proxies,
            runs,
            locks: JobLocks::new(),
            retry: config.retry_policy(),
            championship_event_id: config.championship_event_id,
            ntfy_topic: config.ntfy_topic.clone(),
        }
    }

    /// Jedna stránka přes retry policy; každý pokus si bere novou proxy
    /// a egress chyba proxy penalizuje.
    pub async fn fetch_page(&self, url: &str, specs: Vec<RecordSpec>) -> Result<Extracted, ScrapeError> {
        self.retry
            .run(url, |attempt| {
                let source = Arc::clone(&self.source);
                let proxies = Arc::clone(&self.proxies);
                let url = url.to_string();
                let specs = specs.clone();
                async move {
                    let proxy = proxies.next().await;
                    debug!(attempt, proxy = ?proxy, "fetch {}", url);

                    let result = scrape_blocking(source, url, specs, proxy.clone()).await;
                    if let (Err(e), Some(addr)) = (&result, &proxy) {
                        if e.is_egress_failure() {
                            proxies.mark_failed(addr);
                        }
                    }
                    result
                }
            })
            .await
    }

    /// Event z triggeru; neexistující id je chyba vstupu, ne chyba storu
    pub(crate) fn scoped_event(&self, event_id: i64) -> Result<Event, JobError> {
        match self.store.event(event_id) {
            Ok(event) => Ok(event),
            Err(StoreError::NotFound(_)) => Err(JobError::InvalidInput(format!("event {event_id} does not exist"))),
            Err(e) => Err(e.into()),
        }
    }

    /// Selhání jednoho záznamu/targetu: audit log + počítadlo
    pub(crate) fn record_failed(&self, job: Job, target: &str, reason: &dyn std::fmt::Display, outcome: &mut JobOutcome) {
        self.runs.record_failed(job.name(), target, &reason.to_string());
        outcome.failed += 1;
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────────────

/// Spustí job pod lease a s run loggingem
pub async fn run_job(ctx: &JobContext, job: Job, scope: JobScope) -> Result<JobOutcome, JobError> {
    validate(job, &scope)?;

    let _lease = ctx
        .locks
        .try_acquire(job.name(), job.lease_ttl())
        .ok_or_else(|| JobError::Busy(job.name().to_string()))?;

    let handle = ctx.runs.start(job.name());
    let result = dispatch(ctx, job, scope).await;

    let status = match &result {
        Ok(outcome) => outcome.status(),
        Err(e) => RunStatus::Failed { message: e.to_string() },
    };
    ctx.runs.finish(handle, status);
    result
}

fn validate(job: Job, scope: &JobScope) -> Result<(), JobError> {
    match job {
        Job::CleanMatches if scope.event_id.is_none() => {
            Err(JobError::InvalidInput("clean-matches requires eventId".into()))
        }
        _ => Ok(()),
    }
}

async fn dispatch(ctx: &JobContext, job: Job, scope: JobScope) -> Result<JobOutcome, JobError> {
    match job {
        Job::SyncEvents => events::sync_events(ctx).await,
        Job::SyncParticipants => participants::sync_participants(ctx, scope).await,
        Job::SyncMatches => matches::sync_matches(ctx, scope).await,
        Job::SyncNews => news::sync_news(ctx).await,
        Job::SyncSwiss => swiss::sync_swiss(ctx, scope).await,
        Job::CalculateStats => stats::calculate_stats(ctx, scope),
        Job::CalculateH2h => stats::calculate_h2h(ctx),
        Job::FixStatus => maintenance::fix_status(ctx, Utc::now()),
        Job::HourlyReport => report::hourly_report(ctx).await,
        Job::CleanMatches => match scope.event_id {
            Some(event_id) => clean::clean_matches(ctx, event_id),
            None => Err(JobError::InvalidInput("clean-matches requires eventId".into())),
        },
    }
}
