use super::{JobContext, JobOutcome};
use crate::error::JobError;

/// Smaže zápasy eventu, aby je další sync-matches načetl načisto
pub fn clean_matches(ctx: &JobContext, event_id: i64) -> Result<JobOutcome, JobError> {
    ctx.scoped_event(event_id)?;
    let written = ctx.store.delete_matches_for_event(event_id)?;
    Ok(JobOutcome { written, failed: 0 })
}
