use super::{JobContext, JobOutcome};
use crate::error::JobError;
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use logger::{now_iso, send_ntfy_alert, HourlyReportEvent, JobSummary};
use tracing::info;

/// Souhrn běhů za poslední hodinu + stav tabulek
pub async fn hourly_report(ctx: &JobContext) -> Result<JobOutcome, JobError> {
    let window = ChronoDuration::hours(1);
    let window_from = (Utc::now() - window).to_rfc3339_opts(SecondsFormat::Millis, true);
    let jobs = ctx.runs.summarize(window);
    let counts = ctx.store.counts()?;

    let body = render(&jobs, counts.events, counts.matches, counts.live_matches);
    info!("📈 Hourly report\n{}", body);

    ctx.runs.events().log_quiet(&HourlyReportEvent {
        ts: now_iso(),
        event: "HOURLY_REPORT",
        window_from,
        jobs: jobs.clone(),
        events: counts.events,
        teams: counts.teams,
        matches: counts.matches,
        live_matches: counts.live_matches,
    });

    if let Some(topic) = &ctx.ntfy_topic {
        send_ntfy_alert(topic, &body, "HLTV sync hourly report").await;
    }

    Ok(JobOutcome { written: jobs.len(), failed: 0 })
}

fn render(jobs: &[JobSummary], events: i64, matches: i64, live: i64) -> String {
    let mut out = String::new();
    if jobs.is_empty() {
        out.push_str("no runs in the last hour\n");
    }
    for j in jobs {
        out.push_str(&format!(
            "{}: {} runs ({} ok, {} partial, {} failed), {} records\n",
            j.job, j.runs, j.succeeded, j.partial, j.failed, j.records
        ));
    }
    out.push_str(&format!("db: {} events, {} matches ({} live)", events, matches, live));
    out
}
