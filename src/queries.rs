use anyhow::{Context, Result};
use log::warn;
use rusqlite::Connection;
use rusqlite::types::ValueRef;

/// The fixed set of reporting aggregates. Every variant maps to one SQL
/// text; the reporting layer decides which chart consumes which result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportQuery {
    TopBatsmen,
    TopBowlers,
    DismissalTypes,
    MatchesPerVenue,
    TossWinAnalysis,
    PomAwards,
    OdiBatsmen,
    TestWinPercentage,
    MostCommonMatchType,
    TotalRunsPerInningId,
    InningNumbers,
    TeamHomeAwayWins,
    RunsPerOver,
    TopWicketTakersOdi,
    CenturyCountPerPlayer,
    AverageStrikeRatePerPlayer,
    TotalRunsPerSeason,
    TopBoundaryHitters,
    TossDecisionWins,
}

impl ReportQuery {
    pub const ALL: [ReportQuery; 19] = [
        ReportQuery::TopBatsmen,
        ReportQuery::TopBowlers,
        ReportQuery::DismissalTypes,
        ReportQuery::MatchesPerVenue,
        ReportQuery::TossWinAnalysis,
        ReportQuery::PomAwards,
        ReportQuery::OdiBatsmen,
        ReportQuery::TestWinPercentage,
        ReportQuery::MostCommonMatchType,
        ReportQuery::TotalRunsPerInningId,
        ReportQuery::InningNumbers,
        ReportQuery::TeamHomeAwayWins,
        ReportQuery::RunsPerOver,
        ReportQuery::TopWicketTakersOdi,
        ReportQuery::CenturyCountPerPlayer,
        ReportQuery::AverageStrikeRatePerPlayer,
        ReportQuery::TotalRunsPerSeason,
        ReportQuery::TopBoundaryHitters,
        ReportQuery::TossDecisionWins,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ReportQuery::TopBatsmen => "top_batsmen",
            ReportQuery::TopBowlers => "top_bowlers",
            ReportQuery::DismissalTypes => "dismissal_types",
            ReportQuery::MatchesPerVenue => "matches_per_venue",
            ReportQuery::TossWinAnalysis => "toss_win_analysis",
            ReportQuery::PomAwards => "pom_awards",
            ReportQuery::OdiBatsmen => "odi_batsmen",
            ReportQuery::TestWinPercentage => "test_win_percentage",
            ReportQuery::MostCommonMatchType => "most_common_match_type",
            ReportQuery::TotalRunsPerInningId => "total_runs_per_inning_id",
            ReportQuery::InningNumbers => "inning_numbers",
            ReportQuery::TeamHomeAwayWins => "team_home_away_wins",
            ReportQuery::RunsPerOver => "runs_per_over",
            ReportQuery::TopWicketTakersOdi => "top_wicket_takers_odi",
            ReportQuery::CenturyCountPerPlayer => "century_count_per_player",
            ReportQuery::AverageStrikeRatePerPlayer => "average_strike_rate_per_player",
            ReportQuery::TotalRunsPerSeason => "total_runs_per_season",
            ReportQuery::TopBoundaryHitters => "top_boundary_hitters",
            ReportQuery::TossDecisionWins => "toss_decision_wins",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            ReportQuery::TopBatsmen => {
                "SELECT p.player_name, SUM(d.runs_batter) AS total_runs
                 FROM deliveries d
                 JOIN players p ON d.batter_id = p.player_id
                 GROUP BY p.player_name
                 ORDER BY total_runs DESC
                 LIMIT 10"
            }
            // Run-outs are not credited to the bowler.
            ReportQuery::TopBowlers => {
                "SELECT p.player_name, COUNT(d.wicket_kind) AS total_wickets
                 FROM deliveries d
                 JOIN players p ON d.bowler_id = p.player_id
                 WHERE d.wicket_kind IS NOT NULL AND d.wicket_kind != 'run out'
                 GROUP BY p.player_name
                 ORDER BY total_wickets DESC
                 LIMIT 10"
            }
            ReportQuery::DismissalTypes => {
                "SELECT wicket_kind, COUNT(*) AS dismissal_count
                 FROM deliveries
                 WHERE wicket_kind IS NOT NULL
                 GROUP BY wicket_kind
                 ORDER BY dismissal_count DESC"
            }
            ReportQuery::MatchesPerVenue => {
                "SELECT venue_name, COUNT(*) AS total_matches
                 FROM matches
                 GROUP BY venue_name
                 ORDER BY total_matches DESC
                 LIMIT 20"
            }
            ReportQuery::TossWinAnalysis => {
                "SELECT
                     toss_winner AS team_name,
                     COUNT(*) AS toss_wins,
                     (SUM(CASE WHEN toss_winner = outcome_winner THEN 1 ELSE 0 END) * 100.0) / COUNT(*) AS win_percentage_after_toss_win
                 FROM matches
                 WHERE toss_winner IS NOT NULL
                 GROUP BY toss_winner
                 ORDER BY toss_wins DESC"
            }
            ReportQuery::PomAwards => {
                "SELECT p.player_name, COUNT(*) AS pom_awards
                 FROM player_of_match pom
                 JOIN players p ON pom.player_id = p.player_id
                 GROUP BY p.player_name
                 ORDER BY pom_awards DESC
                 LIMIT 10"
            }
            ReportQuery::OdiBatsmen => {
                "SELECT p.player_name, SUM(d.runs_batter) AS total_runs
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 JOIN matches m ON i.match_id = m.match_id
                 JOIN players p ON d.batter_id = p.player_id
                 WHERE m.match_type = 'ODI'
                 GROUP BY p.player_name
                 ORDER BY total_runs DESC
                 LIMIT 5"
            }
            ReportQuery::TestWinPercentage => {
                "SELECT
                     m.outcome_winner AS team_name,
                     (SUM(CASE WHEN m.outcome_winner IS NOT NULL THEN 1 ELSE 0 END) * 100.0) / COUNT(*) AS win_percentage
                 FROM matches m
                 WHERE m.match_type = 'Test'
                 GROUP BY m.outcome_winner
                 ORDER BY win_percentage DESC"
            }
            ReportQuery::MostCommonMatchType => {
                "SELECT match_type, COUNT(*) AS match_count
                 FROM matches
                 GROUP BY match_type
                 ORDER BY match_count DESC"
            }
            ReportQuery::TotalRunsPerInningId => {
                "SELECT
                     i.inning_id,
                     SUM(d.runs_batter) AS total_runs
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 GROUP BY i.inning_id"
            }
            ReportQuery::InningNumbers => {
                "SELECT inning_id, inning_number FROM innings"
            }
            ReportQuery::TeamHomeAwayWins => {
                "SELECT
                     t.team_name,
                     SUM(CASE WHEN m.outcome_winner = t.team_name THEN 1 ELSE 0 END) AS total_wins
                 FROM match_teams t
                 JOIN matches m ON t.match_id = m.match_id
                 GROUP BY t.team_name
                 ORDER BY total_wins DESC"
            }
            ReportQuery::RunsPerOver => {
                "SELECT
                     i.inning_number,
                     o.over_number,
                     SUM(d.runs_batter) AS runs_scored
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 GROUP BY i.inning_number, o.over_number
                 ORDER BY i.inning_number, o.over_number"
            }
            ReportQuery::TopWicketTakersOdi => {
                "SELECT
                     p.player_name,
                     COUNT(d.wicket_kind) AS total_wickets
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 JOIN matches m ON i.match_id = m.match_id
                 JOIN players p ON d.bowler_id = p.player_id
                 WHERE m.match_type = 'ODI' AND d.wicket_kind IS NOT NULL
                 GROUP BY p.player_name
                 ORDER BY total_wickets DESC
                 LIMIT 10"
            }
            // Grouped per inning, so `centuries` is 1 for every qualifying
            // row; the chart reads it as a count of century innings.
            ReportQuery::CenturyCountPerPlayer => {
                "SELECT
                     p.player_name,
                     COUNT(DISTINCT i.inning_id) AS centuries
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 JOIN players p ON d.batter_id = p.player_id
                 GROUP BY i.inning_id, p.player_name
                 HAVING SUM(d.runs_batter) >= 100
                 ORDER BY centuries DESC
                 LIMIT 10"
            }
            ReportQuery::AverageStrikeRatePerPlayer => {
                "SELECT
                     p.player_name,
                     (SUM(d.runs_batter) * 100.0) / COUNT(d.over_db_id) AS strike_rate
                 FROM deliveries d
                 JOIN players p ON d.batter_id = p.player_id
                 GROUP BY p.player_name
                 HAVING COUNT(d.over_db_id) >= 50
                 ORDER BY strike_rate DESC
                 LIMIT 10"
            }
            ReportQuery::TotalRunsPerSeason => {
                "SELECT
                     m.season,
                     SUM(d.runs_batter) AS total_runs
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 JOIN matches m ON i.match_id = m.match_id
                 GROUP BY m.season
                 ORDER BY m.season"
            }
            ReportQuery::TopBoundaryHitters => {
                "SELECT
                     p.player_name,
                     COUNT(*) AS total_boundaries
                 FROM deliveries d
                 JOIN overs o ON d.over_db_id = o.over_db_id
                 JOIN innings i ON o.inning_id = i.inning_id
                 JOIN players p ON d.batter_id = p.player_id
                 WHERE d.runs_batter IN (4, 6)
                 GROUP BY p.player_name
                 ORDER BY total_boundaries DESC
                 LIMIT 10"
            }
            ReportQuery::TossDecisionWins => {
                "SELECT
                     toss_decision,
                     SUM(CASE WHEN toss_winner = outcome_winner THEN 1 ELSE 0 END) AS wins
                 FROM matches
                 GROUP BY toss_decision"
            }
        }
    }
}

/// One cell of a query result. Aggregates come back as whichever affinity
/// SQLite picked, so consumers coerce through `as_f64`/`label`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            Cell::Real(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Real(v) => Some(*v),
            _ => None,
        }
    }

    /// Axis label rendering. NULL groups (e.g. matches without a recorded
    /// toss decision) become "unknown" rather than vanishing.
    pub fn label(&self) -> String {
        match self {
            Cell::Null => "unknown".to_string(),
            Cell::Int(v) => v.to_string(),
            Cell::Real(v) => format!("{v:.1}"),
            Cell::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl QueryTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (label, value) pairs from two columns, dropping rows whose value
    /// column is not numeric.
    pub fn label_values(&self, label_idx: usize, value_idx: usize) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .filter_map(|row| {
                let label = row.get(label_idx)?.label();
                let value = row.get(value_idx)?.as_f64()?;
                Some((label, value))
            })
            .collect()
    }
}

pub fn run_query(conn: &Connection, query: ReportQuery) -> Result<QueryTable> {
    let mut stmt = conn
        .prepare(query.sql())
        .with_context(|| format!("prepare query {}", query.name()))?;
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let column_count = columns.len();

    let mut rows = stmt
        .query([])
        .with_context(|| format!("execute query {}", query.name()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().with_context(|| format!("step query {}", query.name()))? {
        let mut cells = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            let value = row
                .get_ref(idx)
                .with_context(|| format!("read column {idx} of {}", query.name()))?;
            cells.push(cell_from(value));
        }
        out.push(cells);
    }

    Ok(QueryTable { columns, rows: out })
}

/// Storage errors degrade to an empty table so the chart step can skip
/// instead of aborting the whole report run.
pub fn fetch_or_empty(conn: &Connection, query: ReportQuery) -> QueryTable {
    match run_query(conn, query) {
        Ok(table) => table,
        Err(err) => {
            warn!("Query {} failed: {err:#}", query.name());
            QueryTable::default()
        }
    }
}

fn cell_from(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(v) => Cell::Int(v),
        ValueRef::Real(v) => Cell::Real(v),
        ValueRef::Text(v) => Cell::Text(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => Cell::Text(String::from_utf8_lossy(v).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{self, DeliveryRow, MatchRow};

    fn seeded_conn() -> Connection {
        let conn = store::open_in_memory().unwrap();
        store::upsert_player(&conn, "p1", "Batter One").unwrap();
        store::upsert_player(&conn, "p2", "Bowler Two").unwrap();
        store::upsert_match(
            &conn,
            &MatchRow {
                match_id: "m1".into(),
                match_type: Some("ODI".into()),
                venue_name: Some("Lord's".into()),
                ..MatchRow::default()
            },
        )
        .unwrap();
        let inning = store::insert_inning(&conn, "m1", 1, Some("Team A")).unwrap();
        let over = store::insert_over(&conn, inning, 0).unwrap();
        for (n, runs) in [(1, 4), (2, 6), (3, 0)] {
            store::insert_delivery(
                &conn,
                &DeliveryRow {
                    over_db_id: over,
                    delivery_number: n,
                    batter_id: Some("p1".into()),
                    bowler_id: Some("p2".into()),
                    runs_batter: runs,
                    runs_total: runs,
                    wicket_kind: (runs == 0).then(|| "bowled".to_string()),
                    ..DeliveryRow::default()
                },
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn every_query_runs_on_empty_schema() {
        let conn = store::open_in_memory().unwrap();
        for query in ReportQuery::ALL {
            let table = run_query(&conn, query)
                .unwrap_or_else(|e| panic!("{} should run: {e:#}", query.name()));
            assert!(table.is_empty(), "{} unexpectedly had rows", query.name());
        }
    }

    #[test]
    fn top_batsmen_sums_runs() {
        let conn = seeded_conn();
        let table = run_query(&conn, ReportQuery::TopBatsmen).unwrap();
        assert_eq!(table.columns, vec!["player_name", "total_runs"]);
        let pairs = table.label_values(0, 1);
        assert_eq!(pairs, vec![("Batter One".to_string(), 10.0)]);
    }

    #[test]
    fn bowler_wickets_exclude_run_outs() {
        let conn = seeded_conn();
        // A run-out on the same bowler must not add to the tally.
        let over: i64 = conn
            .query_row("SELECT MAX(over_db_id) FROM overs", [], |r| r.get(0))
            .unwrap();
        store::insert_delivery(
            &conn,
            &DeliveryRow {
                over_db_id: over,
                delivery_number: 4,
                batter_id: Some("p1".into()),
                bowler_id: Some("p2".into()),
                wicket_kind: Some("run out".into()),
                ..DeliveryRow::default()
            },
        )
        .unwrap();

        let table = run_query(&conn, ReportQuery::TopBowlers).unwrap();
        let pairs = table.label_values(0, 1);
        assert_eq!(pairs, vec![("Bowler Two".to_string(), 1.0)]);
    }

    #[test]
    fn odi_filter_applies_to_batsmen() {
        let conn = seeded_conn();
        let table = run_query(&conn, ReportQuery::OdiBatsmen).unwrap();
        assert_eq!(table.label_values(0, 1), vec![("Batter One".to_string(), 10.0)]);

        conn.execute("UPDATE matches SET match_type = 'T20'", [])
            .unwrap();
        let table = run_query(&conn, ReportQuery::OdiBatsmen).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn fetch_or_empty_swallows_storage_errors() {
        let conn = seeded_conn();
        conn.execute_batch("DROP TABLE deliveries").unwrap();
        let table = fetch_or_empty(&conn, ReportQuery::TopBatsmen);
        assert!(table.is_empty());
    }

    #[test]
    fn null_labels_render_as_unknown() {
        assert_eq!(Cell::Null.label(), "unknown");
        assert_eq!(Cell::Text("bat".into()).label(), "bat");
        assert_eq!(Cell::Int(7).label(), "7");
    }
}
