use super::matches::sync_event_matches;
use super::{JobContext, JobOutcome, JobScope};
use crate::error::JobError;
use serde_json::json;
use stats_engine::{reconstruct, stage_from_history};
use tracing::info;

/// Čerstvé zápasy eventu → staging řádky → rekonstrukce stage do metadat eventu
pub async fn sync_swiss(ctx: &JobContext, scope: JobScope) -> Result<JobOutcome, JobError> {
    let event_id = scope
        .event_id
        .or(ctx.championship_event_id)
        .ok_or_else(|| JobError::InvalidInput("sync-swiss needs eventId or a championship event".into()))?;
    let event = ctx.scoped_event(event_id)?;

    let mut outcome = sync_event_matches(ctx, &event, false).await;

    let history = ctx.store.matches_for_event(event.id)?;
    let rows = stage_from_history(event.id, &history);
    outcome.written += ctx.store.replace_swiss_rounds(event.id, &rows)?;

    let stage = reconstruct(event.id, &ctx.store.swiss_entries(event.id)?);
    ctx.store.merge_event_metadata(
        event.id,
        &json!({
            "swiss": {
                "currentRound": stage.current_round,
                "qualified": stage.qualified,
                "eliminated": stage.eliminated,
            }
        }),
    )?;

    info!(
        "🇨🇭 {}: round {}, {} qualified, {} eliminated",
        event.name,
        stage.current_round,
        stage.qualified.len(),
        stage.eliminated.len()
    );
    Ok(outcome)
}
