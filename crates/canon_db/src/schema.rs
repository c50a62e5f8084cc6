use rusqlite::Connection;

pub(crate) fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL,
            date_start TEXT NOT NULL,
            date_end TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('upcoming', 'ongoing', 'finished')),
            is_championship INTEGER NOT NULL DEFAULT 0,
            metadata TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_events_status ON events(status);

        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL,
            rank INTEGER,
            country TEXT,
            logo TEXT,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS event_participants (
            event_id INTEGER NOT NULL REFERENCES events(id),
            team_id INTEGER NOT NULL REFERENCES teams(id),
            seed INTEGER,
            placement INTEGER,
            PRIMARY KEY (event_id, team_id)
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id INTEGER NOT NULL UNIQUE,
            event_id INTEGER NOT NULL REFERENCES events(id),
            team1_id INTEGER NOT NULL REFERENCES teams(id),
            team2_id INTEGER NOT NULL REFERENCES teams(id),
            date TEXT,
            format TEXT NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('scheduled', 'live', 'finished', 'cancelled')),
            score1 INTEGER,
            score2 INTEGER,
            winner_id INTEGER REFERENCES teams(id),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (team1_id <> team2_id)
        );

        CREATE INDEX IF NOT EXISTS idx_matches_event ON matches(event_id);
        CREATE INDEX IF NOT EXISTS idx_matches_status ON matches(status);

        CREATE TABLE IF NOT EXISTS news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            external_id INTEGER NOT NULL UNIQUE,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            published_at TEXT,
            event_id INTEGER REFERENCES events(id)
        );

        CREATE TABLE IF NOT EXISTS swiss_rounds (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL REFERENCES events(id),
            round_number INTEGER NOT NULL CHECK (round_number BETWEEN 1 AND 5),
            bucket TEXT NOT NULL,
            team1_id INTEGER NOT NULL REFERENCES teams(id),
            team2_id INTEGER NOT NULL REFERENCES teams(id),
            match_id INTEGER REFERENCES matches(id),
            team1_record TEXT NOT NULL,
            team2_record TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_swiss_event ON swiss_rounds(event_id, round_number);

        CREATE TABLE IF NOT EXISTS team_stats (
            team_id INTEGER NOT NULL REFERENCES teams(id),
            event_id INTEGER REFERENCES events(id),
            played INTEGER NOT NULL,
            wins INTEGER NOT NULL,
            losses INTEGER NOT NULL,
            maps_won INTEGER NOT NULL,
            maps_lost INTEGER NOT NULL,
            rounds_won INTEGER NOT NULL,
            rounds_lost INTEGER NOT NULL,
            computed_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_team_stats_scope ON team_stats(event_id, team_id);

        CREATE TABLE IF NOT EXISTS head_to_head (
            team_a_id INTEGER NOT NULL REFERENCES teams(id),
            team_b_id INTEGER NOT NULL REFERENCES teams(id),
            event_id INTEGER REFERENCES events(id),
            total INTEGER NOT NULL,
            team_a_wins INTEGER NOT NULL,
            team_b_wins INTEGER NOT NULL,
            last_match_date TEXT,
            CHECK (team_a_id < team_b_id)
        );

        CREATE INDEX IF NOT EXISTS idx_h2h_pair ON head_to_head(team_a_id, team_b_id);
        "#,
    )
}
