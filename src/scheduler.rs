//! Pevné kadence jobů. Každá kadence = vlastní tokio task s intervalem;
//! kroky kadence běží za sebou (championship `sync-matches` → `sync-swiss`).

use crate::error::JobError;
use crate::jobs::{run_job, Job, JobContext, JobScope};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct Cadence {
    pub name: &'static str,
    pub every: Duration,
    /// Zpoždění prvního ticku od startu daemonu
    pub first_run_after: Duration,
    pub steps: Vec<(Job, JobScope)>,
}

pub fn cadences(championship_event_id: Option<i64>) -> Vec<Cadence> {
    let mut out = vec![
        Cadence {
            name: "daily",
            every: 24 * HOUR,
            first_run_after: Duration::ZERO,
            steps: vec![
                (Job::SyncEvents, JobScope::default()),
                (Job::SyncParticipants, JobScope::default()),
                (Job::CalculateStats, JobScope::default()),
                (Job::CalculateH2h, JobScope::default()),
            ],
        },
        Cadence {
            name: "6h",
            every: 6 * HOUR,
            first_run_after: 5 * MINUTE,
            steps: vec![
                (Job::SyncMatches, JobScope::default()),
                (Job::SyncNews, JobScope::default()),
                (Job::FixStatus, JobScope::default()),
            ],
        },
        Cadence {
            name: "hourly",
            every: HOUR,
            first_run_after: HOUR,
            steps: vec![(Job::HourlyReport, JobScope::default())],
        },
    ];

    if championship_event_id.is_some() {
        out.push(Cadence {
            name: "championship",
            every: 10 * MINUTE,
            first_run_after: MINUTE,
            steps: vec![
                (Job::SyncMatches, JobScope::championship()),
                (Job::SyncSwiss, JobScope::default()),
            ],
        });
    }
    out
}

/// Jeden tick kadence. Chyba kroku kadenci nezastaví.
pub async fn run_cadence(ctx: &JobContext, cadence: &Cadence) {
    for (job, scope) in &cadence.steps {
        match run_job(ctx, *job, *scope).await {
            Ok(outcome) => info!("⏱️  [{}] {} → {} records, {} failed", cadence.name, job.name(), outcome.written, outcome.failed),
            Err(JobError::Busy(_)) => warn!("[{}] {} still running, tick skipped", cadence.name, job.name()),
            Err(e) => warn!("[{}] {} failed: {}", cadence.name, job.name(), e),
        }
    }
}

pub fn spawn(ctx: JobContext) -> Vec<JoinHandle<()>> {
    cadences(ctx.championship_event_id)
        .into_iter()
        .map(|cadence| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + cadence.first_run_after, cadence.every);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                info!("🗓️  Cadence {} every {:?}", cadence.name, cadence.every);
                loop {
                    ticker.tick().await;
                    run_cadence(&ctx, &cadence).await;
                }
            })
        })
        .collect()
}
