use super::{Job, JobContext, JobOutcome};
use crate::error::JobError;
use canon_db::{EventStatus, EventUpsert};
use hltv_scraper::pages::{event_list_specs, parse_events, ScrapedEvent};
use serde_json::json;
use tracing::info;

/// /events → upsert ongoing + upcoming eventů
pub async fn sync_events(ctx: &JobContext) -> Result<JobOutcome, JobError> {
    let url = ctx.pages.events_url();
    let extracted = ctx.fetch_page(&url, event_list_specs()).await?;
    let scraped = parse_events(&ctx.pages, &extracted);

    let mut outcome = JobOutcome::default();
    let mut inserted = 0;

    for ev in &scraped {
        match upsert(ctx, ev) {
            Ok(true) => {
                inserted += 1;
                outcome.written += 1;
            }
            Ok(false) => outcome.written += 1,
            Err(e) => ctx.record_failed(Job::SyncEvents, &ev.external_id.to_string(), &e, &mut outcome),
        }
    }

    info!("📅 Events: {} scraped, {} new, {} failed", scraped.len(), inserted, outcome.failed);
    Ok(outcome)
}

fn upsert(ctx: &JobContext, ev: &ScrapedEvent) -> Result<bool, JobError> {
    let is_championship = match (ctx.championship_event_id, ctx.store.event_by_external_id(ev.external_id)?) {
        (Some(champ), Some(existing)) => existing.id == champ,
        _ => false,
    };

    let outcome = ctx.store.upsert_event(&EventUpsert {
        external_id: ev.external_id,
        name: ev.name.clone(),
        date_start: ev.date_start,
        date_end: ev.date_end,
        status: if ev.ongoing { EventStatus::Ongoing } else { EventStatus::Upcoming },
        is_championship,
        metadata: json!({
            "url": ev.url,
            "location": ev.location,
            "prizePool": ev.prize_pool,
        }),
    })?;
    Ok(outcome.inserted)
}
