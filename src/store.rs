use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, params};

/// Flat column set for one `matches` row. Everything except the id is
/// optional because source documents omit fields freely across vintages.
#[derive(Debug, Clone, Default)]
pub struct MatchRow {
    pub match_id: String,
    pub data_version: Option<String>,
    pub created_date: Option<String>,
    pub revision: Option<i64>,
    pub balls_per_over: Option<i64>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub event_name: Option<String>,
    pub event_match_number: Option<i64>,
    pub gender: Option<String>,
    pub match_type: Option<String>,
    pub match_type_number: Option<i64>,
    pub outcome_winner: Option<String>,
    pub outcome_by_wickets: Option<i64>,
    pub outcome_by_runs: Option<i64>,
    pub toss_decision: Option<String>,
    pub toss_winner: Option<String>,
    pub venue_name: Option<String>,
    pub season: Option<String>,
    pub team_type: Option<String>,
}

/// One `deliveries` row, keyed to its parent over by the generated
/// `over_db_id`. Player columns hold registry identifiers and stay NULL
/// when the name did not resolve.
#[derive(Debug, Clone, Default)]
pub struct DeliveryRow {
    pub over_db_id: i64,
    pub delivery_number: i64,
    pub batter_id: Option<String>,
    pub bowler_id: Option<String>,
    pub non_striker_id: Option<String>,
    pub runs_batter: i64,
    pub runs_extras: i64,
    pub runs_total: i64,
    pub extras_wides: i64,
    pub extras_noballs: i64,
    pub extras_byes: i64,
    pub extras_legbyes: i64,
    pub extras_penalty: i64,
    pub wicket_kind: Option<String>,
    pub wicket_player_out_id: Option<String>,
    pub wicket_fielders: Option<String>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS players (
            player_id TEXT PRIMARY KEY,
            player_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS matches (
            match_id TEXT PRIMARY KEY,
            data_version TEXT NULL,
            created_date TEXT NULL,
            revision INTEGER NULL,
            balls_per_over INTEGER NULL,
            city TEXT NULL,
            start_date TEXT NULL,
            end_date TEXT NULL,
            event_name TEXT NULL,
            event_match_number INTEGER NULL,
            gender TEXT NULL,
            match_type TEXT NULL,
            match_type_number INTEGER NULL,
            outcome_winner TEXT NULL,
            outcome_by_wickets INTEGER NULL,
            outcome_by_runs INTEGER NULL,
            toss_decision TEXT NULL,
            toss_winner TEXT NULL,
            venue_name TEXT NULL,
            season TEXT NULL,
            team_type TEXT NULL,
            ingested_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_match_type ON matches(match_type);
        CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(season);

        CREATE TABLE IF NOT EXISTS match_teams (
            match_team_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            team_name TEXT NOT NULL,
            UNIQUE (match_id, team_name),
            FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS match_squads (
            match_squad_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            team_name TEXT NOT NULL,
            player_id TEXT NOT NULL,
            UNIQUE (match_id, player_id),
            FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE,
            FOREIGN KEY (player_id) REFERENCES players(player_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS officials (
            official_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            official_role TEXT NOT NULL,
            FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE,
            FOREIGN KEY (player_id) REFERENCES players(player_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS player_of_match (
            pom_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE,
            FOREIGN KEY (player_id) REFERENCES players(player_id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS innings (
            inning_id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            inning_number INTEGER NOT NULL,
            team_name TEXT NULL,
            FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_innings_match ON innings(match_id);

        CREATE TABLE IF NOT EXISTS overs (
            over_db_id INTEGER PRIMARY KEY AUTOINCREMENT,
            inning_id INTEGER NOT NULL,
            over_number INTEGER NOT NULL,
            FOREIGN KEY (inning_id) REFERENCES innings(inning_id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_overs_inning ON overs(inning_id);

        CREATE TABLE IF NOT EXISTS deliveries (
            delivery_id INTEGER PRIMARY KEY AUTOINCREMENT,
            over_db_id INTEGER NOT NULL,
            delivery_number INTEGER NOT NULL,
            batter_id TEXT NULL,
            bowler_id TEXT NULL,
            non_striker_id TEXT NULL,
            runs_batter INTEGER NULL,
            runs_extras INTEGER NULL,
            runs_total INTEGER NULL,
            extras_wides INTEGER NOT NULL DEFAULT 0,
            extras_noballs INTEGER NOT NULL DEFAULT 0,
            extras_byes INTEGER NOT NULL DEFAULT 0,
            extras_legbyes INTEGER NOT NULL DEFAULT 0,
            extras_penalty INTEGER NOT NULL DEFAULT 0,
            wicket_kind TEXT NULL,
            wicket_player_out_id TEXT NULL,
            wicket_fielders TEXT NULL,
            FOREIGN KEY (over_db_id) REFERENCES overs(over_db_id) ON DELETE CASCADE,
            FOREIGN KEY (batter_id) REFERENCES players(player_id) ON DELETE CASCADE,
            FOREIGN KEY (bowler_id) REFERENCES players(player_id) ON DELETE CASCADE,
            FOREIGN KEY (non_striker_id) REFERENCES players(player_id) ON DELETE CASCADE,
            FOREIGN KEY (wicket_player_out_id) REFERENCES players(player_id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_deliveries_over ON deliveries(over_db_id);
        CREATE INDEX IF NOT EXISTS idx_deliveries_batter ON deliveries(batter_id);
        CREATE INDEX IF NOT EXISTS idx_deliveries_bowler ON deliveries(bowler_id);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            files_total INTEGER NOT NULL,
            files_loaded INTEGER NOT NULL,
            matches_upserted INTEGER NOT NULL,
            deliveries_inserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn upsert_player(conn: &Connection, player_id: &str, player_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO players (player_id, player_name)
         VALUES (?1, ?2)
         ON CONFLICT(player_id) DO UPDATE SET player_name = excluded.player_name",
        params![player_id, player_name],
    )
    .with_context(|| format!("upsert player {player_id}"))?;
    Ok(())
}

pub fn upsert_match(conn: &Connection, m: &MatchRow) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO matches (
            match_id, data_version, created_date, revision, balls_per_over, city,
            start_date, end_date, event_name, event_match_number, gender,
            match_type, match_type_number, outcome_winner, outcome_by_wickets,
            outcome_by_runs, toss_decision, toss_winner, venue_name, season,
            team_type, ingested_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16, ?17, ?18, ?19, ?20,
            ?21, ?22
        )
        ON CONFLICT(match_id) DO UPDATE SET
            data_version = excluded.data_version,
            created_date = excluded.created_date,
            revision = excluded.revision,
            balls_per_over = excluded.balls_per_over,
            city = excluded.city,
            start_date = excluded.start_date,
            end_date = excluded.end_date,
            event_name = excluded.event_name,
            event_match_number = excluded.event_match_number,
            gender = excluded.gender,
            match_type = excluded.match_type,
            match_type_number = excluded.match_type_number,
            outcome_winner = excluded.outcome_winner,
            outcome_by_wickets = excluded.outcome_by_wickets,
            outcome_by_runs = excluded.outcome_by_runs,
            toss_decision = excluded.toss_decision,
            toss_winner = excluded.toss_winner,
            venue_name = excluded.venue_name,
            season = excluded.season,
            team_type = excluded.team_type,
            ingested_at = excluded.ingested_at
        "#,
        params![
            m.match_id,
            m.data_version,
            m.created_date,
            m.revision,
            m.balls_per_over,
            m.city,
            m.start_date,
            m.end_date,
            m.event_name,
            m.event_match_number,
            m.gender,
            m.match_type,
            m.match_type_number,
            m.outcome_winner,
            m.outcome_by_wickets,
            m.outcome_by_runs,
            m.toss_decision,
            m.toss_winner,
            m.venue_name,
            m.season,
            m.team_type,
            Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("upsert match {}", m.match_id))?;
    Ok(())
}

pub fn insert_match_team(conn: &Connection, match_id: &str, team_name: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO match_teams (match_id, team_name)
         VALUES (?1, ?2)
         ON CONFLICT(match_id, team_name) DO UPDATE SET team_name = excluded.team_name",
        params![match_id, team_name],
    )
    .with_context(|| format!("insert team {team_name} for match {match_id}"))?;
    Ok(())
}

pub fn insert_squad_member(
    conn: &Connection,
    match_id: &str,
    team_name: &str,
    player_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO match_squads (match_id, team_name, player_id)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(match_id, player_id) DO UPDATE SET team_name = excluded.team_name",
        params![match_id, team_name, player_id],
    )
    .with_context(|| format!("insert squad member {player_id} for match {match_id}"))?;
    Ok(())
}

// No uniqueness beyond the surrogate key here: re-ingesting a match
// appends a second set of official rows.
pub fn insert_official(
    conn: &Connection,
    match_id: &str,
    player_id: &str,
    official_role: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO officials (match_id, player_id, official_role)
         VALUES (?1, ?2, ?3)",
        params![match_id, player_id, official_role],
    )
    .with_context(|| format!("insert official {player_id} for match {match_id}"))?;
    Ok(())
}

// Same append-only behavior as officials.
pub fn insert_award(conn: &Connection, match_id: &str, player_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO player_of_match (match_id, player_id)
         VALUES (?1, ?2)",
        params![match_id, player_id],
    )
    .with_context(|| format!("insert player of match {player_id} for match {match_id}"))?;
    Ok(())
}

/// Inserts one inning row and returns its generated `inning_id`, which the
/// caller threads to the inning's overs.
pub fn insert_inning(
    conn: &Connection,
    match_id: &str,
    inning_number: i64,
    team_name: Option<&str>,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO innings (match_id, inning_number, team_name)
         VALUES (?1, ?2, ?3)",
        params![match_id, inning_number, team_name],
    )
    .with_context(|| format!("insert inning {inning_number} for match {match_id}"))?;
    Ok(conn.last_insert_rowid())
}

/// Inserts one over row and returns its generated `over_db_id`.
pub fn insert_over(conn: &Connection, inning_id: i64, over_number: i64) -> Result<i64> {
    conn.execute(
        "INSERT INTO overs (inning_id, over_number) VALUES (?1, ?2)",
        params![inning_id, over_number],
    )
    .with_context(|| format!("insert over {over_number} for inning {inning_id}"))?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_delivery(conn: &Connection, d: &DeliveryRow) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO deliveries (
            over_db_id, delivery_number, batter_id, bowler_id, non_striker_id,
            runs_batter, runs_extras, runs_total,
            extras_wides, extras_noballs, extras_byes, extras_legbyes, extras_penalty,
            wicket_kind, wicket_player_out_id, wicket_fielders
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16
        )
        "#,
        params![
            d.over_db_id,
            d.delivery_number,
            d.batter_id,
            d.bowler_id,
            d.non_striker_id,
            d.runs_batter,
            d.runs_extras,
            d.runs_total,
            d.extras_wides,
            d.extras_noballs,
            d.extras_byes,
            d.extras_legbyes,
            d.extras_penalty,
            d.wicket_kind,
            d.wicket_player_out_id,
            d.wicket_fielders,
        ],
    )
    .with_context(|| {
        format!(
            "insert delivery {} for over {}",
            d.delivery_number, d.over_db_id
        )
    })?;
    Ok(())
}

/// Removes a match; foreign keys cascade the delete through teams, squads,
/// officials, awards and the whole innings tree.
pub fn delete_match(conn: &Connection, match_id: &str) -> Result<usize> {
    let removed = conn
        .execute("DELETE FROM matches WHERE match_id = ?1", params![match_id])
        .with_context(|| format!("delete match {match_id}"))?;
    Ok(removed)
}

pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    let n = conn
        .query_row(&sql, [], |row| row.get::<_, i64>(0))
        .with_context(|| format!("count rows in {table}"))?;
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_upsert_is_last_write_wins() {
        let conn = open_in_memory().unwrap();
        upsert_player(&conn, "p1", "J Smith").unwrap();
        upsert_player(&conn, "p1", "John Smith").unwrap();
        let name: String = conn
            .query_row(
                "SELECT player_name FROM players WHERE player_id = 'p1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(name, "John Smith");
        assert_eq!(count_rows(&conn, "players").unwrap(), 1);
    }

    #[test]
    fn match_upsert_overwrites_attributes() {
        let conn = open_in_memory().unwrap();
        let mut row = MatchRow {
            match_id: "abc123".into(),
            venue_name: Some("Old Ground".into()),
            ..MatchRow::default()
        };
        upsert_match(&conn, &row).unwrap();
        row.venue_name = Some("New Ground".into());
        upsert_match(&conn, &row).unwrap();

        assert_eq!(count_rows(&conn, "matches").unwrap(), 1);
        let venue: String = conn
            .query_row(
                "SELECT venue_name FROM matches WHERE match_id = 'abc123'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(venue, "New Ground");
    }

    #[test]
    fn squad_conflict_moves_player_between_teams() {
        let conn = open_in_memory().unwrap();
        upsert_match(
            &conn,
            &MatchRow {
                match_id: "m1".into(),
                ..MatchRow::default()
            },
        )
        .unwrap();
        upsert_player(&conn, "p1", "A Player").unwrap();

        insert_squad_member(&conn, "m1", "Team A", "p1").unwrap();
        insert_squad_member(&conn, "m1", "Team B", "p1").unwrap();

        assert_eq!(count_rows(&conn, "match_squads").unwrap(), 1);
        let team: String = conn
            .query_row(
                "SELECT team_name FROM match_squads WHERE match_id = 'm1' AND player_id = 'p1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(team, "Team B");
    }

    #[test]
    fn officials_append_on_repeat_insert() {
        let conn = open_in_memory().unwrap();
        upsert_match(
            &conn,
            &MatchRow {
                match_id: "m1".into(),
                ..MatchRow::default()
            },
        )
        .unwrap();
        upsert_player(&conn, "u1", "An Umpire").unwrap();

        insert_official(&conn, "m1", "u1", "umpire").unwrap();
        insert_official(&conn, "m1", "u1", "umpire").unwrap();
        assert_eq!(count_rows(&conn, "officials").unwrap(), 2);
    }

    #[test]
    fn generated_ids_thread_parent_to_child() {
        let conn = open_in_memory().unwrap();
        upsert_match(
            &conn,
            &MatchRow {
                match_id: "m1".into(),
                ..MatchRow::default()
            },
        )
        .unwrap();

        let inning_id = insert_inning(&conn, "m1", 1, Some("Team A")).unwrap();
        let over_id = insert_over(&conn, inning_id, 0).unwrap();
        insert_delivery(
            &conn,
            &DeliveryRow {
                over_db_id: over_id,
                delivery_number: 1,
                runs_total: 4,
                runs_batter: 4,
                ..DeliveryRow::default()
            },
        )
        .unwrap();

        let (got_over, got_runs): (i64, i64) = conn
            .query_row(
                "SELECT over_db_id, runs_total FROM deliveries WHERE delivery_number = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(got_over, over_id);
        assert_eq!(got_runs, 4);
    }
}
