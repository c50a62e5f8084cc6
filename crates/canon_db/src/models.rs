use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
#[error("unknown status `{0}`")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Finished,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Ongoing => "ongoing",
            EventStatus::Finished => "finished",
        }
    }
}

impl FromStr for EventStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(EventStatus::Upcoming),
            "ongoing" => Ok(EventStatus::Ongoing),
            "finished" => Ok(EventStatus::Finished),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Live => "live",
            MatchStatus::Finished => "finished",
            MatchStatus::Cancelled => "cancelled",
        }
    }

    /// Pořadí pro monotónní posun stavu; finished i cancelled jsou terminální
    pub fn rank(&self) -> u8 {
        match self {
            MatchStatus::Scheduled => 0,
            MatchStatus::Live => 1,
            MatchStatus::Finished | MatchStatus::Cancelled => 2,
        }
    }
}

impl FromStr for MatchStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "live" => Ok(MatchStatus::Live),
            "finished" => Ok(MatchStatus::Finished),
            "cancelled" => Ok(MatchStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

sql_text_enum!(EventStatus);
sql_text_enum!(MatchStatus);

// ── Canonical entity ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub status: EventStatus,
    pub is_championship: bool,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: i64,
    pub external_id: i64,
    pub name: String,
    pub rank: Option<i64>,
    pub country: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventParticipant {
    pub event_id: i64,
    pub team_id: i64,
    pub seed: Option<i64>,
    pub placement: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Match {
    pub id: i64,
    pub external_id: i64,
    pub event_id: i64,
    pub team1_id: i64,
    pub team2_id: i64,
    pub date: Option<DateTime<Utc>>,
    pub format: String,
    pub status: MatchStatus,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
    pub winner_id: Option<i64>,
}

impl Match {
    pub fn involves(&self, team_id: i64) -> bool {
        self.team1_id == team_id || self.team2_id == team_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct News {
    pub id: i64,
    pub external_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub event_id: Option<i64>,
}

// ── Upsert vstupy ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EventUpsert {
    pub external_id: i64,
    pub name: String,
    pub date_start: NaiveDate,
    pub date_end: NaiveDate,
    pub status: EventStatus,
    pub is_championship: bool,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct TeamUpsert {
    pub external_id: i64,
    pub name: String,
    pub rank: Option<i64>,
    pub country: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MatchUpsert {
    pub external_id: i64,
    pub event_id: i64,
    pub team1_id: i64,
    pub team2_id: i64,
    pub date: Option<DateTime<Utc>>,
    pub format: String,
    pub status: MatchStatus,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
    pub winner_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewsUpsert {
    pub external_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
    pub event_id: Option<i64>,
}

/// Výsledek upsertu: id řádku a jestli vznikl nový
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub inserted: bool,
}

// ── Odvozené / staging řádky ─────────────────────────────────────────────────

/// Staging řádek jednoho párování ve Swiss stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwissRoundRow {
    pub event_id: i64,
    pub round_number: i64,
    pub bucket: String,
    pub team1_id: i64,
    pub team2_id: i64,
    pub match_id: Option<i64>,
    pub team1_record: String,
    pub team2_record: String,
}

/// Swiss řádek spojený se stavem zápasu (pro rekonstrukci)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwissEntry {
    pub row: SwissRoundRow,
    pub status: Option<MatchStatus>,
    pub winner_id: Option<i64>,
    pub score1: Option<i64>,
    pub score2: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamStatsRow {
    pub team_id: i64,
    pub event_id: Option<i64>,
    pub played: i64,
    pub wins: i64,
    pub losses: i64,
    pub maps_won: i64,
    pub maps_lost: i64,
    pub rounds_won: i64,
    pub rounds_lost: i64,
}

/// Uloženo vždy s team_a_id < team_b_id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadToHeadRow {
    pub team_a_id: i64,
    pub team_b_id: i64,
    pub event_id: Option<i64>,
    pub total: i64,
    pub team_a_wins: i64,
    pub team_b_wins: i64,
    pub last_match_date: Option<DateTime<Utc>>,
}

impl HeadToHeadRow {
    /// Stejný agregát z pohledu druhého týmu
    pub fn flipped(&self) -> Self {
        Self {
            team_a_id: self.team_b_id,
            team_b_id: self.team_a_id,
            event_id: self.event_id,
            total: self.total,
            team_a_wins: self.team_b_wins,
            team_b_wins: self.team_a_wins,
            last_match_date: self.last_match_date,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchActivity {
    pub total: i64,
    pub scheduled: i64,
    pub live: i64,
    pub finished: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub events: i64,
    pub teams: i64,
    pub matches: i64,
    pub live_matches: i64,
    pub news: i64,
}
