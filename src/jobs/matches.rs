use super::{Job, JobContext, JobOutcome, JobScope};
use crate::error::JobError;
use canon_db::{Event, EventStatus, MatchStatus, MatchUpsert, TeamUpsert};
use hltv_scraper::pages::{match_list_specs, parse_matches, ScrapedMatch, ScrapedMatchStatus, ScrapedTeamRef};
use tracing::info;

const JOB: Job = Job::SyncMatches;

/// Zápasy eventů: `eventId` → jeden event s korekcí, `championship` → jen
/// sledovaný event, jinak všechny ongoing + upcoming.
pub async fn sync_matches(ctx: &JobContext, scope: JobScope) -> Result<JobOutcome, JobError> {
    let (targets, correction) = match (scope.event_id, scope.championship) {
        (Some(id), _) => (vec![ctx.scoped_event(id)?], true),
        (None, true) => {
            let id = ctx
                .championship_event_id
                .ok_or_else(|| JobError::InvalidInput("no championship event configured".into()))?;
            (vec![ctx.scoped_event(id)?], false)
        }
        (None, false) => (ctx.store.events_with_status(&[EventStatus::Ongoing, EventStatus::Upcoming])?, false),
    };

    let mut outcome = JobOutcome::default();
    for event in &targets {
        outcome.merge(sync_event_matches(ctx, event, correction).await);
    }
    Ok(outcome)
}

/// Results + upcoming stránka jednoho eventu. Chyba stránky je failed target,
/// ne chyba jobu.
pub(crate) async fn sync_event_matches(ctx: &JobContext, event: &Event, correction: bool) -> JobOutcome {
    let mut outcome = JobOutcome::default();
    let urls = [ctx.pages.results_url(event.external_id), ctx.pages.upcoming_url(event.external_id)];

    for url in &urls {
        let extracted = match ctx.fetch_page(url, match_list_specs()).await {
            Ok(x) => x,
            Err(e) => {
                ctx.record_failed(JOB, url, &e, &mut outcome);
                continue;
            }
        };

        for m in parse_matches(&extracted) {
            match store_match(ctx, event.id, &m, correction) {
                Ok(()) => outcome.written += 1,
                Err(e) => ctx.record_failed(JOB, &m.external_id.to_string(), &e, &mut outcome),
            }
        }
    }

    info!("⚔️  {}: {} matches written, {} failed", event.name, outcome.written, outcome.failed);
    outcome
}

fn store_match(ctx: &JobContext, event_id: i64, m: &ScrapedMatch, correction: bool) -> Result<(), JobError> {
    let team1_id = resolve_team(ctx, &m.team1)?;
    let team2_id = resolve_team(ctx, &m.team2)?;
    let status = map_status(m.status);

    let winner_id = match (status, m.score1, m.score2) {
        (MatchStatus::Finished, Some(s1), Some(s2)) if s1 > s2 => Some(team1_id),
        (MatchStatus::Finished, Some(s1), Some(s2)) if s2 > s1 => Some(team2_id),
        _ => None,
    };

    ctx.store.upsert_match(
        &MatchUpsert {
            external_id: m.external_id,
            event_id,
            team1_id,
            team2_id,
            date: m.date,
            format: m.format.clone(),
            status,
            score1: m.score1,
            score2: m.score2,
            winner_id,
        },
        correction,
    )?;
    Ok(())
}

/// Tým ze zápasu; prázdné jméno nepřepíše to, co už známe
fn resolve_team(ctx: &JobContext, team: &ScrapedTeamRef) -> Result<i64, JobError> {
    let name = if team.name.is_empty() {
        match ctx.store.team_by_external_id(team.external_id)? {
            Some(known) => known.name,
            None => format!("team-{}", team.external_id),
        }
    } else {
        team.name.clone()
    };

    let stored = ctx.store.upsert_team(&TeamUpsert { external_id: team.external_id, name, ..TeamUpsert::default() })?;
    Ok(stored.id)
}

fn map_status(status: ScrapedMatchStatus) -> MatchStatus {
    match status {
        ScrapedMatchStatus::Scheduled => MatchStatus::Scheduled,
        ScrapedMatchStatus::Live => MatchStatus::Live,
        ScrapedMatchStatus::Finished => MatchStatus::Finished,
        ScrapedMatchStatus::Cancelled => MatchStatus::Cancelled,
    }
}
