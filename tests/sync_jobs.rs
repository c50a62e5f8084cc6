mod common;

use canon_db::{EventStatus, EventUpsert, MatchStatus};
use chrono::{Duration as ChronoDuration, Utc};
use common::{harness, Harness, BASE};
use hltv_scraper::{RetryPolicy, ScrapeError};
use hltv_sync::{run_job, Job, JobError, JobOutcome, JobScope};
use proxy_pool::ProxyPool;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

async fn run(h: &Harness, job: Job, scope: JobScope) -> JobOutcome {
    run_job(&h.ctx, job, scope).await.unwrap()
}

#[tokio::test]
async fn sync_events_twice_creates_no_new_rows() {
    let h = harness();
    h.serve_all();

    let first = run(&h, Job::SyncEvents, JobScope::default()).await;
    assert_eq!(first, JobOutcome { written: 2, failed: 0 });

    let second = run(&h, Job::SyncEvents, JobScope::default()).await;
    assert_eq!(second.written, 2);
    assert_eq!(h.ctx.store.counts().unwrap().events, 2);

    let major = h.ctx.store.event_by_external_id(7148).unwrap().unwrap();
    assert_eq!(major.status, EventStatus::Ongoing);
    assert_eq!(major.metadata["location"], "Copenhagen, Denmark");
    let cologne = h.ctx.store.event_by_external_id(7500).unwrap().unwrap();
    assert_eq!(cologne.status, EventStatus::Upcoming);

    // bez proxy poolu jde všechno napřímo
    assert!(h.pages.requests().iter().all(|(_, proxy)| proxy.is_none()));
}

#[tokio::test]
async fn missing_event_list_fails_the_whole_job() {
    let h = harness();

    let err = run_job(&h.ctx, Job::SyncEvents, JobScope::default()).await.unwrap_err();
    assert!(matches!(err, JobError::Scrape(_)));

    let summary = h.ctx.runs.summarize(ChronoDuration::hours(1));
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].failed, 1);
}

#[tokio::test]
async fn sync_matches_is_partial_when_one_event_page_is_missing() {
    let h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;

    // 7148: 3 výsledky + 1 upcoming (TBD řádek se přeskočí), 7500 nemá stránky
    let outcome = run(&h, Job::SyncMatches, JobScope::default()).await;
    assert_eq!(outcome, JobOutcome { written: 4, failed: 2 });

    let again = run(&h, Job::SyncMatches, JobScope::default()).await;
    assert_eq!(again.written, 4);

    let counts = h.ctx.store.counts().unwrap();
    assert_eq!(counts.matches, 4);
    assert_eq!(counts.teams, 4);

    let navi_faze = h.ctx.store.match_by_external_id(2370727).unwrap().unwrap();
    assert_eq!(navi_faze.status, MatchStatus::Finished);
    assert_eq!(navi_faze.winner_id, Some(h.team_id(4608)));
    assert_eq!(navi_faze.format, "bo3");

    let summary = h.ctx.runs.summarize(ChronoDuration::hours(1));
    let matches = summary.iter().find(|s| s.job == "sync-matches").unwrap();
    assert_eq!(matches.partial, 2);
    assert_eq!(matches.records, 8);
}

#[tokio::test]
async fn championship_scope_needs_configured_event() {
    let h = harness();
    let err = run_job(&h.ctx, Job::SyncMatches, JobScope::championship()).await.unwrap_err();
    assert!(matches!(err, JobError::InvalidInput(_)));
}

/// 2370727 je v results dohraný, tady se tváří jako naplánovaný
const REGRESSED_UPCOMING_HTML: &str = r#"
<html><head><title>Matches | HLTV.org</title></head><body>
  <div class="upcomingMatch">
    <a href="/matches/2370727/navi-vs-faze"></a>
    <div class="matchTime" data-unix="1710900000000"></div>
    <div class="team1"><a href="/team/4608/natus-vincere"><div class="team">Natus Vincere</div></a></div>
    <div class="team2"><a href="/team/6667/faze"><div class="team">FaZe</div></a></div>
    <div class="map-text">bo3</div>
  </div>
</body></html>
"#;

#[tokio::test]
async fn championship_scope_syncs_only_that_event_without_correction() {
    let mut h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;
    let event_id = h.event_id(7148);
    h.ctx.championship_event_id = Some(event_id);
    h.pages.insert(format!("{BASE}/matches?event=7148"), REGRESSED_UPCOMING_HTML);

    let before = h.pages.requests().len();
    let outcome = run(&h, Job::SyncMatches, JobScope::championship()).await;
    assert_eq!(outcome, JobOutcome { written: 4, failed: 0 });

    // 7500 (upcoming, bez stránek) se vůbec nezkouší
    let urls: Vec<String> = h.pages.requests()[before..].iter().map(|(url, _)| url.clone()).collect();
    assert_eq!(urls, vec![format!("{BASE}/results?event=7148"), format!("{BASE}/matches?event=7148")]);

    let kept = h.ctx.store.match_by_external_id(2370727).unwrap().unwrap();
    assert_eq!(kept.status, MatchStatus::Finished);
    assert_eq!(kept.winner_id, Some(h.team_id(4608)));

    // explicitní eventId je korekce: stav smí jít zpět
    run(&h, Job::SyncMatches, JobScope::event(event_id)).await;
    let corrected = h.ctx.store.match_by_external_id(2370727).unwrap().unwrap();
    assert_eq!(corrected.status, MatchStatus::Scheduled);
}

#[tokio::test]
async fn unknown_event_scope_is_invalid_input() {
    let h = harness();
    h.serve_all();

    for job in [Job::SyncMatches, Job::SyncParticipants, Job::SyncSwiss, Job::CalculateStats, Job::CleanMatches] {
        let err = run_job(&h.ctx, job, JobScope::event(999)).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidInput(_)), "{}: {err}", job.name());
    }
    assert!(h.pages.requests().is_empty());
}

#[tokio::test]
async fn each_retry_takes_next_proxy_and_charges_egress_failures() {
    let mut h = harness();
    h.ctx.proxies = Arc::new(ProxyPool::from_addresses(["a:1", "b:2"]));
    h.ctx.retry = RetryPolicy::new(3, Duration::from_millis(1));

    // titulní stránka chybí → Network chyba na každém pokusu
    let err = run_job(&h.ctx, Job::SyncNews, JobScope::default()).await.unwrap_err();
    assert!(matches!(err, JobError::Scrape(ScrapeError::Network(_))));

    let proxies: Vec<Option<String>> = h.pages.requests().into_iter().map(|(_, proxy)| proxy).collect();
    assert_eq!(proxies, vec![Some("a:1".into()), Some("b:2".into()), Some("a:1".into())]);

    let failures = |addr: &str| {
        h.ctx.proxies.snapshot().into_iter().find(|p| p.address == addr).map(|p| p.failures)
    };
    assert_eq!(failures("a:1"), Some(2));
    assert_eq!(failures("b:2"), Some(1));
}

#[tokio::test]
async fn blocked_page_rotates_proxies_without_charging_them() {
    let mut h = harness();
    h.ctx.proxies = Arc::new(ProxyPool::from_addresses(["a:1", "b:2"]));
    h.ctx.retry = RetryPolicy::new(2, Duration::from_millis(1));
    h.pages.insert(format!("{BASE}/"), "<html><head><title>Just a moment...</title></head><body></body></html>");

    let err = run_job(&h.ctx, Job::SyncNews, JobScope::default()).await.unwrap_err();
    assert!(matches!(err, JobError::Scrape(ScrapeError::Blocked(_))));

    let proxies: Vec<Option<String>> = h.pages.requests().into_iter().map(|(_, proxy)| proxy).collect();
    assert_eq!(proxies, vec![Some("a:1".into()), Some("b:2".into())]);
    assert!(h.ctx.proxies.snapshot().iter().all(|p| p.failures == 0));
}

#[tokio::test]
async fn participants_and_ranking_are_stored() {
    let h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;
    let event_id = h.event_id(7148);

    let outcome = run(&h, Job::SyncParticipants, JobScope::event(event_id)).await;
    assert_eq!(outcome, JobOutcome { written: 4, failed: 0 });

    let participants = h.ctx.store.participants(event_id).unwrap();
    assert_eq!(participants.len(), 2);
    assert_eq!(participants.iter().find(|p| p.team_id == h.team_id(4608)).unwrap().seed, Some(1));

    // ranking jede po stránce eventu a má poslední slovo
    let navi = h.ctx.store.team_by_external_id(4608).unwrap().unwrap();
    assert_eq!(navi.rank, Some(1));
    assert_eq!(navi.country.as_deref(), Some("Ukraine"));
    // "#3 (+2)": pohyb v žebříčku se do ranku nepočítá
    assert_eq!(h.ctx.store.team_by_external_id(7020).unwrap().unwrap().rank, Some(3));

    let event = h.ctx.store.event(event_id).unwrap();
    assert_eq!(event.metadata["stages"][0]["external_id"], 7259);
    assert_eq!(event.metadata["location"], "Copenhagen, Denmark");
}

#[tokio::test]
async fn news_sync_is_idempotent() {
    let h = harness();
    h.serve_all();

    assert_eq!(run(&h, Job::SyncNews, JobScope::default()).await.written, 2);
    assert_eq!(run(&h, Job::SyncNews, JobScope::default()).await.written, 2);

    let news = h.ctx.store.latest_news(10).unwrap();
    assert_eq!(news.len(), 2);
    assert_eq!(news[0].title, "Cologne invites revealed");
    assert_eq!(news[1].url, format!("{BASE}/news/38912/major-recap"));
}

#[tokio::test]
async fn clean_matches_removes_only_matches() {
    let h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;
    let event_id = h.event_id(7148);
    run(&h, Job::SyncMatches, JobScope::event(event_id)).await;

    let outcome = run(&h, Job::CleanMatches, JobScope::event(event_id)).await;
    assert_eq!(outcome.written, 4);

    let counts = h.ctx.store.counts().unwrap();
    assert_eq!(counts.matches, 0);
    assert_eq!(counts.teams, 4);
    assert_eq!(counts.events, 2);
}

#[tokio::test]
async fn clean_matches_rejects_missing_or_unknown_event() {
    let h = harness();

    let missing = run_job(&h.ctx, Job::CleanMatches, JobScope::default()).await.unwrap_err();
    assert!(matches!(missing, JobError::InvalidInput(_)));

    let unknown = run_job(&h.ctx, Job::CleanMatches, JobScope::event(999)).await.unwrap_err();
    assert!(matches!(unknown, JobError::InvalidInput(_)));
}

#[tokio::test]
async fn stats_and_h2h_are_recomputed_identically() {
    let h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;
    let event_id = h.event_id(7148);
    run(&h, Job::SyncMatches, JobScope::event(event_id)).await;

    run(&h, Job::CalculateStats, JobScope::default()).await;
    let all_time = h.ctx.store.team_stats(None).unwrap();
    let per_event = h.ctx.store.team_stats(Some(event_id)).unwrap();

    run(&h, Job::CalculateStats, JobScope::default()).await;
    assert_eq!(h.ctx.store.team_stats(None).unwrap(), all_time);
    assert_eq!(h.ctx.store.team_stats(Some(event_id)).unwrap(), per_event);

    let navi = all_time.iter().find(|s| s.team_id == h.team_id(4608)).unwrap();
    assert_eq!((navi.played, navi.wins, navi.losses), (2, 2, 0));
    assert_eq!((navi.maps_won, navi.maps_lost), (4, 1));

    let faze = all_time.iter().find(|s| s.team_id == h.team_id(6667)).unwrap();
    assert_eq!((faze.wins, faze.losses), (1, 1));
    assert_eq!((faze.rounds_won, faze.rounds_lost), (16, 14));
    // scheduled zápas Vitality se nepočítá
    assert!(all_time.iter().all(|s| s.team_id != h.team_id(9565)));

    run(&h, Job::CalculateH2h, JobScope::default()).await;
    let (navi_id, faze_id) = (h.team_id(4608), h.team_id(6667));
    let forward = h.ctx.store.head_to_head(navi_id, faze_id, None).unwrap().unwrap();
    let backward = h.ctx.store.head_to_head(faze_id, navi_id, None).unwrap().unwrap();
    assert_eq!((forward.total, forward.team_a_wins, forward.team_b_wins), (1, 1, 0));
    assert_eq!((backward.team_a_wins, backward.team_b_wins), (0, 1));
    assert!(h.ctx.store.head_to_head(navi_id, faze_id, Some(event_id)).unwrap().is_some());
}

#[tokio::test]
async fn swiss_sync_stages_history_and_writes_metadata() {
    let mut h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;
    let event_id = h.event_id(7148);
    h.ctx.championship_event_id = Some(event_id);

    let outcome = run(&h, Job::SyncSwiss, JobScope::default()).await;
    assert_eq!(outcome.failed, 0);

    let entries = h.ctx.store.swiss_entries(event_id).unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| (1..=5).contains(&e.row.round_number)));

    let event = h.ctx.store.event(event_id).unwrap();
    assert!(event.metadata["swiss"]["currentRound"].as_i64().unwrap() >= 1);
    // metadata ze sync-events zůstala
    assert_eq!(event.metadata["location"], "Copenhagen, Denmark");

    // druhý běh staging přepíše, nepřidá
    run(&h, Job::SyncSwiss, JobScope::event(event_id)).await;
    assert_eq!(h.ctx.store.swiss_entries(event_id).unwrap().len(), 4);
}

#[tokio::test]
async fn swiss_sync_without_event_is_invalid() {
    let h = harness();
    let err = run_job(&h.ctx, Job::SyncSwiss, JobScope::default()).await.unwrap_err();
    assert!(matches!(err, JobError::InvalidInput(_)));
}

#[tokio::test]
async fn fix_status_forces_future_event_to_upcoming() {
    let h = harness();
    let today = Utc::now().date_naive();
    h.ctx
        .store
        .upsert_event(&EventUpsert {
            external_id: 8000,
            name: "Future Major".into(),
            date_start: today + ChronoDuration::days(30),
            date_end: today + ChronoDuration::days(40),
            status: EventStatus::Ongoing,
            is_championship: false,
            metadata: json!({}),
        })
        .unwrap();

    let outcome = run(&h, Job::FixStatus, JobScope::default()).await;
    assert_eq!(outcome.written, 1);
    assert_eq!(h.ctx.store.event_by_external_id(8000).unwrap().unwrap().status, EventStatus::Upcoming);

    // nic dalšího ke změně
    assert_eq!(run(&h, Job::FixStatus, JobScope::default()).await.written, 0);
}

#[tokio::test]
async fn held_lease_makes_run_busy() {
    let h = harness();
    h.serve_all();

    let _held = h.ctx.locks.try_acquire("sync-news", Duration::from_secs(60)).unwrap();
    let err = run_job(&h.ctx, Job::SyncNews, JobScope::default()).await.unwrap_err();
    assert!(matches!(err, JobError::Busy(_)));

    // jiný job lease nesdílí
    assert!(run_job(&h.ctx, Job::SyncEvents, JobScope::default()).await.is_ok());
}

#[tokio::test]
async fn hourly_report_summarises_recent_runs() {
    let h = harness();
    h.serve_all();
    run(&h, Job::SyncEvents, JobScope::default()).await;
    run(&h, Job::SyncNews, JobScope::default()).await;

    let outcome = run(&h, Job::HourlyReport, JobScope::default()).await;
    assert_eq!(outcome.written, 2);

    let log = std::fs::read_dir(&h.log_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| std::fs::read_to_string(e.path()).unwrap())
        .collect::<String>();
    assert!(log.contains("\"HOURLY_REPORT\""));
    assert!(log.contains("\"JOB_FINISHED\""));
}
