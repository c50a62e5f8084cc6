use super::{Job, JobContext, JobOutcome};
use crate::error::JobError;
use canon_db::NewsUpsert;
use hltv_scraper::pages::{news_specs, parse_news};
use tracing::info;

pub async fn sync_news(ctx: &JobContext) -> Result<JobOutcome, JobError> {
    let url = ctx.pages.news_url();
    let extracted = ctx.fetch_page(&url, news_specs()).await?;

    let mut outcome = JobOutcome::default();
    let mut fresh = 0;
    for item in parse_news(&ctx.pages, &extracted) {
        let upsert = NewsUpsert {
            external_id: item.external_id,
            title: item.title,
            url: item.url,
            published_at: item.published_at,
            event_id: None,
        };
        match ctx.store.upsert_news(&upsert) {
            Ok(o) => {
                outcome.written += 1;
                if o.inserted {
                    fresh += 1;
                }
            }
            Err(e) => ctx.record_failed(Job::SyncNews, &upsert.external_id.to_string(), &e, &mut outcome),
        }
    }

    info!("📰 News: {} stored ({} new)", outcome.written, fresh);
    Ok(outcome)
}
