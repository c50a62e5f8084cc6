use super::{Job, JobContext, JobOutcome, JobScope};
use crate::error::JobError;
use canon_db::{Event, EventStatus, TeamUpsert};
use hltv_scraper::pages::{event_page_specs, parse_participants, parse_ranking, parse_stage_links, ranking_specs, ScrapedTeam};
use serde_json::json;
use tracing::info;

const JOB: Job = Job::SyncParticipants;

/// Účastníci eventů (stránka eventu) + world ranking pass
pub async fn sync_participants(ctx: &JobContext, scope: JobScope) -> Result<JobOutcome, JobError> {
    let targets: Vec<Event> = match scope.event_id {
        Some(id) => vec![ctx.scoped_event(id)?],
        None => ctx.store.events_with_status(&[EventStatus::Ongoing, EventStatus::Upcoming])?,
    };

    let mut outcome = JobOutcome::default();
    for event in &targets {
        let url = ctx.pages.event_url(event.external_id);
        match ctx.fetch_page(&url, event_page_specs()).await {
            Ok(extracted) => {
                let teams = parse_participants(&extracted);
                for team in &teams {
                    match store_participant(ctx, event.id, team) {
                        Ok(()) => outcome.written += 1,
                        Err(e) => ctx.record_failed(JOB, &team.external_id.to_string(), &e, &mut outcome),
                    }
                }

                let stages = parse_stage_links(&ctx.pages, &extracted);
                if !stages.is_empty() {
                    if let Err(e) = ctx.store.merge_event_metadata(event.id, &json!({ "stages": stages })) {
                        ctx.record_failed(JOB, &url, &e, &mut outcome);
                    }
                }
                info!("👥 {}: {} teams, {} stage links", event.name, teams.len(), stages.len());
            }
            Err(e) => ctx.record_failed(JOB, &url, &e, &mut outcome),
        }
    }

    // ranking běží i bez scope, ale jen jednou za běh
    let url = ctx.pages.ranking_url();
    match ctx.fetch_page(&url, ranking_specs()).await {
        Ok(extracted) => {
            let ranked = parse_ranking(&extracted);
            for team in &ranked {
                match ctx.store.upsert_team(&team_upsert(team)) {
                    Ok(_) => outcome.written += 1,
                    Err(e) => ctx.record_failed(JOB, &team.external_id.to_string(), &e, &mut outcome),
                }
            }
            info!("🏆 Ranking: {} teams", ranked.len());
        }
        Err(e) => ctx.record_failed(JOB, &url, &e, &mut outcome),
    }

    Ok(outcome)
}

fn team_upsert(team: &ScrapedTeam) -> TeamUpsert {
    TeamUpsert {
        external_id: team.external_id,
        name: team.name.clone(),
        rank: team.rank,
        country: team.country.clone(),
        logo: team.logo.clone(),
    }
}

fn store_participant(ctx: &JobContext, event_id: i64, team: &ScrapedTeam) -> Result<(), JobError> {
    let stored = ctx.store.upsert_team(&team_upsert(team))?;
    ctx.store.upsert_participant(event_id, stored.id, team.seed)?;
    Ok(())
}
