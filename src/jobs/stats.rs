use super::{JobContext, JobOutcome, JobScope};
use crate::error::JobError;
use stats_engine::{compute_head_to_head, compute_team_stats};
use tracing::info;

/// Přepočet team stats. S `eventId` jen ten scope, jinak all-time + každý
/// event s dohranými zápasy, vše jednou transakcí.
pub fn calculate_stats(ctx: &JobContext, scope: JobScope) -> Result<JobOutcome, JobError> {
    if let Some(event_id) = scope.event_id {
        ctx.scoped_event(event_id)?;
        let finished = ctx.store.finished_matches(Some(event_id))?;
        let rows = compute_team_stats(&finished, Some(event_id));
        let written = ctx.store.replace_team_stats(Some(event_id), &rows)?;
        info!("📊 Stats for event {}: {} teams", event_id, written);
        return Ok(JobOutcome { written, failed: 0 });
    }

    let finished = ctx.store.finished_matches(None)?;
    let mut rows = compute_team_stats(&finished, None);
    for event_id in ctx.store.events_with_finished_matches()? {
        let scoped: Vec<_> = finished.iter().filter(|m| m.event_id == event_id).cloned().collect();
        rows.extend(compute_team_stats(&scoped, Some(event_id)));
    }

    let written = ctx.store.replace_all_team_stats(&rows)?;
    info!("📊 Stats: {} rows from {} finished matches", written, finished.len());
    Ok(JobOutcome { written, failed: 0 })
}

/// H2H vždy celé znovu: all-time + per event
pub fn calculate_h2h(ctx: &JobContext) -> Result<JobOutcome, JobError> {
    let finished = ctx.store.finished_matches(None)?;
    let rows = compute_head_to_head(&finished);
    let written = ctx.store.replace_head_to_head(&rows)?;
    info!("🤝 H2H: {} rows", written);
    Ok(JobOutcome { written, failed: 0 })
}
