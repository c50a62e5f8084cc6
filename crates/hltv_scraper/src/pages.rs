//! HLTV stránky: URL, selektory a převod extrahovaných záznamů na typované řádky.
//!
//! Struktura (zjednodušeně):
//!   /events                 → a.ongoing-event, a.big-event, a.small-event
//!   /events/<id>/<slug>     → .team-box (účastníci), .related-events a (stage linky)
//!   /ranking/teams          → .ranked-team
//!   /results?event=<id>     → .result-con
//!   /matches?event=<id>     → .upcomingMatch, .liveMatch
//!   /                       → a.newsline (news)
//!
//! Záznam bez povinného pole (id, jméno, datum) se tiše přeskočí, markup se mění.

use crate::extract::{Extracted, Record, RecordSpec};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

const ONGOING: &str = "ongoing";
const UPCOMING: &str = "upcoming";
const PARTICIPANTS: &str = "participants";
const STAGE_LINKS: &str = "stage_links";
const RANKING: &str = "ranking";
const MATCHES: &str = "matches";
const NEWS: &str = "news";

#[derive(Debug, Clone)]
pub struct HltvPages {
    base: String,
}

impl HltvPages {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into().trim_end_matches('/').to_string() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn events_url(&self) -> String {
        format!("{}/events", self.base)
    }

    pub fn event_url(&self, external_id: i64) -> String {
        format!("{}/events/{}/event", self.base, external_id)
    }

    pub fn results_url(&self, event_external_id: i64) -> String {
        format!("{}/results?event={}", self.base, event_external_id)
    }

    pub fn upcoming_url(&self, event_external_id: i64) -> String {
        format!("{}/matches?event={}", self.base, event_external_id)
    }

    pub fn ranking_url(&self) -> String {
        format!("{}/ranking/teams", self.base)
    }

    pub fn news_url(&self) -> String {
        format!("{}/", self.base)
    }

    /// Absolutní URL z relativního href
    pub fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            href.to_string()
        } else {
            format!("{}{}", self.base, href)
        }
    }
}

// ── Specs ────────────────────────────────────────────────────────────────────

fn event_card(name: &str, root: &str) -> RecordSpec {
    RecordSpec::new(name, root)
        .own_attr("href", "href")
        .text("name", ".event-name-small .text-ellipsis, .big-event-name")
        .attr("start", ".event-date span[data-unix]:first-child", "data-unix")
        .attr("end", ".event-date span[data-unix]:last-child", "data-unix")
        .text("location", ".event-location")
        .text("prize_pool", ".prize-pool")
}

pub fn event_list_specs() -> Vec<RecordSpec> {
    vec![
        event_card(ONGOING, "a.ongoing-event"),
        event_card(UPCOMING, "a.big-event, a.small-event"),
    ]
}

pub fn event_page_specs() -> Vec<RecordSpec> {
    vec![
        RecordSpec::new(PARTICIPANTS, ".team-box")
            .own_attr("seed", "data-seed")
            .attr("href", ".team-name a", "href")
            .text("name", ".team-name .text")
            .attr("logo", "img.team-logo", "src")
            .text("rank", ".event-world-rank"),
        RecordSpec::new(STAGE_LINKS, ".related-events a[href]")
            .own_attr("href", "href")
            .own_text("name"),
    ]
}

pub fn ranking_specs() -> Vec<RecordSpec> {
    vec![RecordSpec::new(RANKING, ".ranked-team")
        .text("rank", ".position")
        .text("name", ".teamLine .name")
        .attr("href", "a.moreLink", "href")
        .attr("country", ".team-flag img", "title")
        .attr("logo", ".team-logo img", "src")]
}

pub fn match_list_specs() -> Vec<RecordSpec> {
    vec![RecordSpec::new(MATCHES, ".result-con, .upcomingMatch, .liveMatch")
        .own_attr("class", "class")
        .own_attr("unix", "data-zonedgrouping-entry-unix")
        .attr("time", "[data-unix]", "data-unix")
        .attr("href", "a[href^='/matches/']", "href")
        .attr("team1_href", ".team1 a[href^='/team/']", "href")
        .text("team1_name", ".team1 .team")
        .attr("team2_href", ".team2 a[href^='/team/']", "href")
        .text("team2_name", ".team2 .team")
        .text("score1", ".result-score span:first-child")
        .text("score2", ".result-score span:last-child")
        .text("format", ".map-text")
        .text("meta", ".matchMeta")]
}

pub fn news_specs() -> Vec<RecordSpec> {
    vec![RecordSpec::new(NEWS, "a.newsline")
        .own_attr("href", "href")
        .own_attr("unix", "data-unix")
        .text("title", ".newstext")]
}

// ── Typed rows ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedEvent {
    pub external_id: i64,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    /// true = z "ongoing" sekce
    pub ongoing: bool,
    pub url: String,
    pub location: Option<String>,
    pub prize_pool: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedTeam {
    pub external_id: i64,
    pub name: String,
    pub rank: Option<i64>,
    pub country: Option<String>,
    pub logo: Option<String>,
    pub seed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageLink {
    pub external_id: i64,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScrapedMatchStatus {
    Scheduled,
    Live,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedMatch {
    pub external_id: i64,
    pub team1: ScrapedTeamRef,
    pub team2: ScrapedTeamRef,
    pub date: Option<DateTime<Utc>>,
    pub format: String,
    pub status: ScrapedMatchStatus,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapedTeamRef {
    pub external_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedNews {
    pub external_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Číselné id za prefixem: "/matches/2365125/navi-vs-faze" → 2365125
pub fn id_after(href: &str, prefix: &str) -> Option<i64> {
    let start = href.find(prefix)? + prefix.len();
    let digits: String = href[start..].chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn unix_ms(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw?.trim().parse::<i64>().ok().and_then(DateTime::<Utc>::from_timestamp_millis)
}

/// První souvislý běh číslic: "#12 (+3)" → 12
fn leading_number(raw: Option<&str>) -> Option<i64> {
    let digits: String = raw?
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn to_event(pages: &HltvPages, rec: &Record, ongoing: bool) -> Option<ScrapedEvent> {
    let href = rec.get("href")?;
    let external_id = id_after(href, "/events/")?;
    let name = rec.get("name")?.to_string();
    let date_start = unix_ms(rec.get("start"))?.date_naive();
    let date_end = unix_ms(rec.get("end")).map(|d| d.date_naive()).unwrap_or(date_start);

    Some(ScrapedEvent {
        external_id,
        name,
        date_start,
        date_end,
        ongoing,
        url: pages.absolute(href),
        location: rec.get("location").map(str::to_string),
        prize_pool: rec.get("prize_pool").map(str::to_string),
    })
}

pub fn parse_events(pages: &HltvPages, out: &Extracted) -> Vec<ScrapedEvent> {
    let mut events = Vec::new();
    for (section, ongoing) in [(ONGOING, true), (UPCOMING, false)] {
        for rec in out.records(section) {
            match to_event(pages, rec, ongoing) {
                Some(ev) if !events.iter().any(|e: &ScrapedEvent| e.external_id == ev.external_id) => events.push(ev),
                Some(_) => {}
                None => debug!("skipping {} event record without id/name/date: {:?}", section, rec),
            }
        }
    }
    events
}

pub fn parse_participants(out: &Extracted) -> Vec<ScrapedTeam> {
    out.records(PARTICIPANTS)
        .iter()
        .filter_map(|rec| {
            Some(ScrapedTeam {
                external_id: id_after(rec.get("href")?, "/team/")?,
                name: rec.get("name")?.to_string(),
                rank: leading_number(rec.get("rank")),
                country: None,
                logo: rec.get("logo").map(str::to_string),
                seed: leading_number(rec.get("seed")),
            })
        })
        .collect()
}

pub fn parse_stage_links(pages: &HltvPages, out: &Extracted) -> Vec<StageLink> {
    out.records(STAGE_LINKS)
        .iter()
        .filter_map(|rec| {
            let href = rec.get("href")?;
            Some(StageLink {
                external_id: id_after(href, "/events/")?,
                name: rec.get("name").unwrap_or_default().to_string(),
                url: pages.absolute(href),
            })
        })
        .collect()
}

pub fn parse_ranking(out: &Extracted) -> Vec<ScrapedTeam> {
    out.records(RANKING)
        .iter()
        .filter_map(|rec| {
            Some(ScrapedTeam {
                external_id: id_after(rec.get("href")?, "/team/")?,
                name: rec.get("name")?.to_string(),
                rank: leading_number(rec.get("rank")),
                country: rec.get("country").map(str::to_string),
                logo: rec.get("logo").map(str::to_string),
                seed: None,
            })
        })
        .collect()
}

fn team_ref(rec: &Record, side: &str) -> Option<ScrapedTeamRef> {
    let href = rec.get(&format!("{side}_href"))?;
    Some(ScrapedTeamRef {
        external_id: id_after(href, "/team/")?,
        name: rec.get(&format!("{side}_name")).unwrap_or_default().to_string(),
    })
}

/// bo1 výsledky místo "bo1" ukazují jméno mapy
fn series_format(raw: Option<&str>) -> String {
    match raw.map(|s| s.trim().to_lowercase()) {
        Some(f) if f.starts_with("bo") && f.len() > 2 => f,
        _ => "bo1".to_string(),
    }
}

fn to_match(rec: &Record) -> Option<ScrapedMatch> {
    let external_id = id_after(rec.get("href")?, "/matches/")?;
    let team1 = team_ref(rec, "team1")?;
    let team2 = team_ref(rec, "team2")?;

    let class = rec.get("class").unwrap_or_default();
    let meta = rec.get("meta").unwrap_or_default().to_lowercase();
    let score1 = rec.get("score1").and_then(|s| s.trim().parse::<i64>().ok());
    let score2 = rec.get("score2").and_then(|s| s.trim().parse::<i64>().ok());

    let status = if meta.contains("cancel") {
        ScrapedMatchStatus::Cancelled
    } else if class.split_whitespace().any(|c| c == "result-con") {
        // výsledek bez skóre je rozbitý řádek
        if score1.is_none() || score2.is_none() {
            return None;
        }
        ScrapedMatchStatus::Finished
    } else if class.split_whitespace().any(|c| c == "liveMatch") {
        ScrapedMatchStatus::Live
    } else {
        ScrapedMatchStatus::Scheduled
    };

    Some(ScrapedMatch {
        external_id,
        team1,
        team2,
        date: unix_ms(rec.get("unix")).or_else(|| unix_ms(rec.get("time"))),
        format: series_format(rec.get("format")),
        status,
        score1,
        score2,
    })
}

pub fn parse_matches(out: &Extracted) -> Vec<ScrapedMatch> {
    let mut matches: Vec<ScrapedMatch> = Vec::new();
    for rec in out.records(MATCHES) {
        match to_match(rec) {
            Some(m) if !matches.iter().any(|x| x.external_id == m.external_id) => matches.push(m),
            Some(_) => {}
            None => debug!("skipping match record (TBD team or missing id): {:?}", rec),
        }
    }
    matches
}

pub fn parse_news(pages: &HltvPages, out: &Extracted) -> Vec<ScrapedNews> {
    out.records(NEWS)
        .iter()
        .filter_map(|rec| {
            let href = rec.get("href")?;
            Some(ScrapedNews {
                external_id: id_after(href, "/news/")?,
                title: rec.get("title")?.to_string(),
                url: pages.absolute(href),
                published_at: unix_ms(rec.get("unix")),
            })
        })
        .collect()
}
