//! Canonical storage: SQLite, upsert podle externího ID ze zdroje.
//!
//! Každá entita (event, tým, zápas, novinka) má UNIQUE `external_id`; sync
//! jen volá `upsert_*` a nikdy nevytvoří druhý řádek pro stejné ID.
//! Agregáty (team_stats, head_to_head) a Swiss staging se nahrazují celé
//! v jedné transakci, nikdy se neupravují po kouscích.

mod models;
mod schema;

pub use models::*;

use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(rusqlite::Error),
    /// Porušené omezení; fatální jen pro daný záznam
    #[error("integrity violation: {0}")]
    Integrity(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("corrupt stored value: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
                StoreError::Integrity(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
                StoreError::Corrupt(e.to_string())
            }
            _ => StoreError::Sqlite(e),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sdílený handle na jednu SQLite connection (klonovatelný mezi joby)
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = path.as_ref();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        let store = Self::from_connection(conn)?;
        info!("🗄️  Canonical store open: {}", db_path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        schema::init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        // panika jiného vlákna connection nerozbije, jen otráví mutex
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }

    // ── Events ───────────────────────────────────────────────────────────────

    pub fn upsert_event(&self, e: &EventUpsert) -> StoreResult<UpsertOutcome> {
        let metadata = serde_json::to_string(&e.metadata).map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let existing = id_by_external(&tx, "events", e.external_id)?;

        let id: i64 = tx.query_row(
            r#"
            INSERT INTO events(external_id, name, date_start, date_end, status, is_championship, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(external_id) DO UPDATE SET
                name=excluded.name,
                date_start=excluded.date_start,
                date_end=excluded.date_end,
                status=excluded.status,
                is_championship=MAX(events.is_championship, excluded.is_championship),
                metadata=json_patch(events.metadata, excluded.metadata),
                updated_at=datetime('now')
            RETURNING id
            "#,
            params![e.external_id, e.name, e.date_start, e.date_end, e.status, e.is_championship, metadata],
            |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(UpsertOutcome { id, inserted: existing.is_none() })
    }

    pub fn event(&self, id: i64) -> StoreResult<Event> {
        let conn = self.lock();
        conn.query_row(&format!("{EVENT_COLUMNS} WHERE id = ?1"), params![id], event_from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("event {id}")))?
    }

    pub fn event_by_external_id(&self, external_id: i64) -> StoreResult<Option<Event>> {
        let conn = self.lock();
        conn.query_row(&format!("{EVENT_COLUMNS} WHERE external_id = ?1"), params![external_id], event_from_row)
            .optional()?
            .transpose()
    }

    pub fn all_events(&self) -> StoreResult<Vec<Event>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("{EVENT_COLUMNS} ORDER BY date_start, id"))?;
        let rows = stmt.query_map([], event_from_row)?;
        collect_nested(rows)
    }

    pub fn events_with_status(&self, statuses: &[EventStatus]) -> StoreResult<Vec<Event>> {
        Ok(self.all_events()?
            .into_iter()
            .filter(|e| statuses.contains(&e.status))
            .collect())
    }

    /// Vrací true, pokud se stav skutečně změnil
    pub fn set_event_status(&self, id: i64, status: EventStatus) -> StoreResult<bool> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE events SET status = ?2, updated_at = datetime('now') WHERE id = ?1 AND status <> ?2",
            params![id, status],
        )?;
        Ok(changed > 0)
    }

    /// RFC 7386 merge do existujících metadat
    pub fn merge_event_metadata(&self, id: i64, patch: &serde_json::Value) -> StoreResult<()> {
        let patch = serde_json::to_string(patch).map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let conn = self.lock();
        let n = conn.execute(
            "UPDATE events SET metadata = json_patch(metadata, ?2), updated_at = datetime('now') WHERE id = ?1",
            params![id, patch],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("event {id}")));
        }
        Ok(())
    }

    // ── Teams ────────────────────────────────────────────────────────────────

    /// Chybějící volitelná pole nepřepisují už uložené hodnoty
    pub fn upsert_team(&self, t: &TeamUpsert) -> StoreResult<UpsertOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let existing = id_by_external(&tx, "teams", t.external_id)?;

        let id: i64 = tx.query_row(
            r#"
            INSERT INTO teams(external_id, name, rank, country, logo)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(external_id) DO UPDATE SET
                name=excluded.name,
                rank=COALESCE(excluded.rank, teams.rank),
                country=COALESCE(excluded.country, teams.country),
                logo=COALESCE(excluded.logo, teams.logo),
                updated_at=datetime('now')
            RETURNING id
            "#,
            params![t.external_id, t.name, t.rank, t.country, t.logo],
            |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(UpsertOutcome { id, inserted: existing.is_none() })
    }

    pub fn team(&self, id: i64) -> StoreResult<Team> {
        let conn = self.lock();
        conn.query_row(&format!("{TEAM_COLUMNS} WHERE id = ?1"), params![id], team_from_row)
            .optional()?
            .ok_or_else(|| StoreError::NotFound(format!("team {id}")))
    }

    pub fn team_by_external_id(&self, external_id: i64) -> StoreResult<Option<Team>> {
        let conn = self.lock();
        Ok(conn.query_row(&format!("{TEAM_COLUMNS} WHERE external_id = ?1"), params![external_id], team_from_row)
            .optional()?)
    }

    pub fn teams(&self) -> StoreResult<Vec<Team>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!("{TEAM_COLUMNS} ORDER BY id"))?;
        let rows = stmt.query_map([], team_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Participants ─────────────────────────────────────────────────────────

    /// Vrací true pro novou asociaci (event, tým)
    pub fn upsert_participant(&self, event_id: i64, team_id: i64, seed: Option<i64>) -> StoreResult<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM event_participants WHERE event_id = ?1 AND team_id = ?2",
                params![event_id, team_id],
                |r| r.get(0),
            )
            .optional()?;

        tx.execute(
            r#"
            INSERT INTO event_participants(event_id, team_id, seed)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(event_id, team_id) DO UPDATE SET
                seed=COALESCE(excluded.seed, event_participants.seed)
            "#,
            params![event_id, team_id, seed],
        )?;
        tx.commit()?;
        Ok(exists.is_none())
    }

    pub fn participants(&self, event_id: i64) -> StoreResult<Vec<EventParticipant>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT event_id, team_id, seed, placement FROM event_participants WHERE event_id = ?1 ORDER BY seed IS NULL, seed, team_id",
        )?;
        let rows = stmt.query_map(params![event_id], |r| {
            Ok(EventParticipant {
                event_id: r.get(0)?,
                team_id: r.get(1)?,
                seed: r.get(2)?,
                placement: r.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Pro kolaborátory, kteří počítají konečné umístění
    pub fn set_placement(&self, event_id: i64, team_id: i64, placement: Option<i64>) -> StoreResult<()> {
        let conn = self.lock();
        let n = conn.execute(
            "UPDATE event_participants SET placement = ?3 WHERE event_id = ?1 AND team_id = ?2",
            params![event_id, team_id, placement],
        )?;
        if n == 0 {
            return Err(StoreError::NotFound(format!("participant team {team_id} in event {event_id}")));
        }
        Ok(())
    }

    // ── Matches ──────────────────────────────────────────────────────────────

    /// Upsert zápasu. Bez `correction` se stav nikdy neposune zpět
    /// (scheduled < live < finished|cancelled); uložený výsledek pak zůstává.
    pub fn upsert_match(&self, m: &MatchUpsert, correction: bool) -> StoreResult<UpsertOutcome> {
        if m.team1_id == m.team2_id {
            return Err(StoreError::Integrity(format!("match {} has the same team on both sides", m.external_id)));
        }
        if let Some(w) = m.winner_id {
            if w != m.team1_id && w != m.team2_id {
                return Err(StoreError::Integrity(format!("match {} winner {} did not play", m.external_id, w)));
            }
        }

        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let existing: Option<(i64, MatchStatus)> = tx
            .query_row(
                "SELECT id, status FROM matches WHERE external_id = ?1",
                params![m.external_id],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        let keep_result = match existing {
            Some((_, stored)) if !correction && stored.rank() > m.status.rank() => {
                debug!("match {} stays {} (source says {})", m.external_id, stored, m.status);
                true
            }
            _ => false,
        };

        let id: i64 = tx.query_row(
            r#"
            INSERT INTO matches(external_id, event_id, team1_id, team2_id, date, format, status, score1, score2, winner_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(external_id) DO UPDATE SET
                event_id=excluded.event_id,
                team1_id=excluded.team1_id,
                team2_id=excluded.team2_id,
                date=COALESCE(excluded.date, matches.date),
                format=excluded.format,
                status=CASE WHEN ?11 THEN matches.status ELSE excluded.status END,
                score1=CASE WHEN ?11 THEN matches.score1 ELSE excluded.score1 END,
                score2=CASE WHEN ?11 THEN matches.score2 ELSE excluded.score2 END,
                winner_id=CASE WHEN ?11 THEN matches.winner_id ELSE excluded.winner_id END,
                updated_at=datetime('now')
            RETURNING id
            "#,
            params![
                m.external_id,
                m.event_id,
                m.team1_id,
                m.team2_id,
                m.date,
                m.format,
                m.status,
                m.score1,
                m.score2,
                m.winner_id,
                keep_result,
            ],
            |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(UpsertOutcome { id, inserted: existing.is_none() })
    }

    pub fn match_by_external_id(&self, external_id: i64) -> StoreResult<Option<Match>> {
        let conn = self.lock();
        Ok(conn.query_row(&format!("{MATCH_COLUMNS} WHERE external_id = ?1"), params![external_id], match_from_row)
            .optional()?)
    }

    /// Zápasy eventu podle data, pak externího ID
    pub fn matches_for_event(&self, event_id: i64) -> StoreResult<Vec<Match>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{MATCH_COLUMNS} WHERE event_id = ?1 ORDER BY date IS NULL, date, external_id"
        ))?;
        let rows = stmt.query_map(params![event_id], match_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Dohrané zápasy; `None` = všechny eventy
    pub fn finished_matches(&self, event_id: Option<i64>) -> StoreResult<Vec<Match>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{MATCH_COLUMNS} WHERE status = 'finished' AND (?1 IS NULL OR event_id = ?1) ORDER BY date IS NULL, date, external_id"
        ))?;
        let rows = stmt.query_map(params![event_id], match_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn match_activity(&self, event_id: i64) -> StoreResult<MatchActivity> {
        let conn = self.lock();
        Ok(conn.query_row(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(status = 'scheduled'), 0),
                   COALESCE(SUM(status = 'live'), 0),
                   COALESCE(SUM(status = 'finished'), 0)
            FROM matches WHERE event_id = ?1
            "#,
            params![event_id],
            |r| {
                Ok(MatchActivity {
                    total: r.get(0)?,
                    scheduled: r.get(1)?,
                    live: r.get(2)?,
                    finished: r.get(3)?,
                })
            },
        )?)
    }

    /// Smaže všechny zápasy eventu (i Swiss řádky, které na ně odkazují).
    /// Týmy ani eventy nemění.
    pub fn delete_matches_for_event(&self, event_id: i64) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM swiss_rounds WHERE event_id = ?1", params![event_id])?;
        let deleted = tx.execute("DELETE FROM matches WHERE event_id = ?1", params![event_id])?;
        tx.commit()?;
        info!("🧹 Deleted {} matches of event {}", deleted, event_id);
        Ok(deleted)
    }

    pub fn events_with_finished_matches(&self) -> StoreResult<Vec<i64>> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT DISTINCT event_id FROM matches WHERE status = 'finished' ORDER BY event_id")?;
        let rows = stmt.query_map([], |r| r.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── News ─────────────────────────────────────────────────────────────────

    pub fn upsert_news(&self, n: &NewsUpsert) -> StoreResult<UpsertOutcome> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let existing = id_by_external(&tx, "news", n.external_id)?;

        let id: i64 = tx.query_row(
            r#"
            INSERT INTO news(external_id, title, url, published_at, event_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(external_id) DO UPDATE SET
                title=excluded.title,
                url=excluded.url,
                published_at=COALESCE(excluded.published_at, news.published_at),
                event_id=COALESCE(excluded.event_id, news.event_id)
            RETURNING id
            "#,
            params![n.external_id, n.title, n.url, n.published_at, n.event_id],
            |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(UpsertOutcome { id, inserted: existing.is_none() })
    }

    pub fn latest_news(&self, limit: usize) -> StoreResult<Vec<News>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, external_id, title, url, published_at, event_id FROM news ORDER BY published_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |r| {
            Ok(News {
                id: r.get(0)?,
                external_id: r.get(1)?,
                title: r.get(2)?,
                url: r.get(3)?,
                published_at: r.get(4)?,
                event_id: r.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Swiss staging ────────────────────────────────────────────────────────

    /// Nahradí všechny Swiss řádky eventu jednou transakcí
    pub fn replace_swiss_rounds(&self, event_id: i64, rows: &[SwissRoundRow]) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM swiss_rounds WHERE event_id = ?1", params![event_id])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO swiss_rounds(event_id, round_number, bucket, team1_id, team2_id, match_id, team1_record, team2_record)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )?;
            for row in rows {
                if row.event_id != event_id {
                    return Err(StoreError::Integrity(format!(
                        "swiss row for event {} staged under event {}",
                        row.event_id, event_id
                    )));
                }
                stmt.execute(params![
                    event_id,
                    row.round_number,
                    row.bucket,
                    row.team1_id,
                    row.team2_id,
                    row.match_id,
                    row.team1_record,
                    row.team2_record,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn swiss_entries(&self, event_id: i64) -> StoreResult<Vec<SwissEntry>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT s.event_id, s.round_number, s.bucket, s.team1_id, s.team2_id, s.match_id,
                   s.team1_record, s.team2_record, m.status, m.winner_id, m.score1, m.score2
            FROM swiss_rounds s
            LEFT JOIN matches m ON m.id = s.match_id
            WHERE s.event_id = ?1
            ORDER BY s.round_number, s.id
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], |r| {
            Ok(SwissEntry {
                row: SwissRoundRow {
                    event_id: r.get(0)?,
                    round_number: r.get(1)?,
                    bucket: r.get(2)?,
                    team1_id: r.get(3)?,
                    team2_id: r.get(4)?,
                    match_id: r.get(5)?,
                    team1_record: r.get(6)?,
                    team2_record: r.get(7)?,
                },
                status: r.get(8)?,
                winner_id: r.get(9)?,
                score1: r.get(10)?,
                score2: r.get(11)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ── Aggregates ───────────────────────────────────────────────────────────

    /// Přepíše celý scope (`None` = all-time); nic se nemerguje
    pub fn replace_team_stats(&self, event_id: Option<i64>, rows: &[TeamStatsRow]) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM team_stats WHERE event_id IS ?1", params![event_id])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO team_stats(team_id, event_id, played, wins, losses, maps_won, maps_lost, rounds_won, rounds_lost)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for s in rows {
                stmt.execute(params![
                    s.team_id,
                    event_id,
                    s.played,
                    s.wins,
                    s.losses,
                    s.maps_won,
                    s.maps_lost,
                    s.rounds_won,
                    s.rounds_lost,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// Nahradí všechny scope najednou; `event_id` bere z řádku
    pub fn replace_all_team_stats(&self, rows: &[TeamStatsRow]) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM team_stats", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO team_stats(team_id, event_id, played, wins, losses, maps_won, maps_lost, rounds_won, rounds_lost)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )?;
            for s in rows {
                stmt.execute(params![
                    s.team_id,
                    s.event_id,
                    s.played,
                    s.wins,
                    s.losses,
                    s.maps_won,
                    s.maps_lost,
                    s.rounds_won,
                    s.rounds_lost,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn team_stats(&self, event_id: Option<i64>) -> StoreResult<Vec<TeamStatsRow>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT team_id, event_id, played, wins, losses, maps_won, maps_lost, rounds_won, rounds_lost
            FROM team_stats WHERE event_id IS ?1 ORDER BY team_id
            "#,
        )?;
        let rows = stmt.query_map(params![event_id], |r| {
            Ok(TeamStatsRow {
                team_id: r.get(0)?,
                event_id: r.get(1)?,
                played: r.get(2)?,
                wins: r.get(3)?,
                losses: r.get(4)?,
                maps_won: r.get(5)?,
                maps_lost: r.get(6)?,
                rounds_won: r.get(7)?,
                rounds_lost: r.get(8)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Nahradí celou tabulku H2H (všechny scope) jednou transakcí
    pub fn replace_head_to_head(&self, rows: &[HeadToHeadRow]) -> StoreResult<usize> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM head_to_head", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO head_to_head(team_a_id, team_b_id, event_id, total, team_a_wins, team_b_wins, last_match_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for h in rows {
                let h = if h.team_a_id > h.team_b_id { h.flipped() } else { h.clone() };
                stmt.execute(params![
                    h.team_a_id,
                    h.team_b_id,
                    h.event_id,
                    h.total,
                    h.team_a_wins,
                    h.team_b_wins,
                    h.last_match_date,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    pub fn head_to_head_rows(&self, event_id: Option<i64>) -> StoreResult<Vec<HeadToHeadRow>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "{H2H_COLUMNS} WHERE event_id IS ?1 ORDER BY team_a_id, team_b_id"
        ))?;
        let rows = stmt.query_map(params![event_id], h2h_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Agregát orientovaný podle pořadí argumentů: `team_a_wins` patří `a`
    pub fn head_to_head(&self, a: i64, b: i64, event_id: Option<i64>) -> StoreResult<Option<HeadToHeadRow>> {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let conn = self.lock();
        let row = conn
            .query_row(
                &format!("{H2H_COLUMNS} WHERE team_a_id = ?1 AND team_b_id = ?2 AND event_id IS ?3"),
                params![lo, hi, event_id],
                h2h_from_row,
            )
            .optional()?;
        Ok(row.map(|h| if h.team_a_id == a { h } else { h.flipped() }))
    }

    pub fn counts(&self) -> StoreResult<TableCounts> {
        let conn = self.lock();
        Ok(conn.query_row(
            r#"
            SELECT (SELECT COUNT(*) FROM events),
                   (SELECT COUNT(*) FROM teams),
                   (SELECT COUNT(*) FROM matches),
                   (SELECT COUNT(*) FROM matches WHERE status = 'live'),
                   (SELECT COUNT(*) FROM news)
            "#,
            [],
            |r| {
                Ok(TableCounts {
                    events: r.get(0)?,
                    teams: r.get(1)?,
                    matches: r.get(2)?,
                    live_matches: r.get(3)?,
                    news: r.get(4)?,
                })
            },
        )?)
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────────

const EVENT_COLUMNS: &str =
    "SELECT id, external_id, name, date_start, date_end, status, is_championship, metadata FROM events";
const TEAM_COLUMNS: &str = "SELECT id, external_id, name, rank, country, logo FROM teams";
const MATCH_COLUMNS: &str =
    "SELECT id, external_id, event_id, team1_id, team2_id, date, format, status, score1, score2, winner_id FROM matches";
const H2H_COLUMNS: &str =
    "SELECT team_a_id, team_b_id, event_id, total, team_a_wins, team_b_wins, last_match_date FROM head_to_head";

fn id_by_external(conn: &Connection, table: &str, external_id: i64) -> rusqlite::Result<Option<i64>> {
    conn.query_row(&format!("SELECT id FROM {table} WHERE external_id = ?1"), params![external_id], |r| r.get(0))
        .optional()
}

/// Metadata se parsují mimo rusqlite, chyba JSON = Corrupt
fn event_from_row(r: &Row<'_>) -> rusqlite::Result<StoreResult<Event>> {
    let raw: String = r.get(7)?;
    let date_start: NaiveDate = r.get(3)?;
    let date_end: NaiveDate = r.get(4)?;
    let event = Event {
        id: r.get(0)?,
        external_id: r.get(1)?,
        name: r.get(2)?,
        date_start,
        date_end,
        status: r.get(5)?,
        is_championship: r.get(6)?,
        metadata: serde_json::Value::Null,
    };
    Ok(serde_json::from_str(&raw)
        .map(|metadata| Event { metadata, ..event })
        .map_err(|e| StoreError::Corrupt(format!("event metadata: {e}"))))
}

fn collect_nested<I>(rows: I) -> StoreResult<Vec<Event>>
where
    I: Iterator<Item = rusqlite::Result<StoreResult<Event>>>,
{
    let mut out = Vec::new();
    for row in rows {
        out.push(row??);
    }
    Ok(out)
}

fn team_from_row(r: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: r.get(0)?,
        external_id: r.get(1)?,
        name: r.get(2)?,
        rank: r.get(3)?,
        country: r.get(4)?,
        logo: r.get(5)?,
    })
}

fn match_from_row(r: &Row<'_>) -> rusqlite::Result<Match> {
    Ok(Match {
        id: r.get(0)?,
        external_id: r.get(1)?,
        event_id: r.get(2)?,
        team1_id: r.get(3)?,
        team2_id: r.get(4)?,
        date: r.get(5)?,
        format: r.get(6)?,
        status: r.get(7)?,
        score1: r.get(8)?,
        score2: r.get(9)?,
        winner_id: r.get(10)?,
    })
}

fn h2h_from_row(r: &Row<'_>) -> rusqlite::Result<HeadToHeadRow> {
    Ok(HeadToHeadRow {
        team_a_id: r.get(0)?,
        team_b_id: r.get(1)?,
        event_id: r.get(2)?,
        total: r.get(3)?,
        team_a_wins: r.get(4)?,
        team_b_wins: r.get(5)?,
        last_match_date: r.get(6)?,
    })
}
