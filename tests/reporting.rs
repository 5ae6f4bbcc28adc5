use std::fs;
use std::path::PathBuf;

use cricsummary::ingest::load_match_document;
use cricsummary::match_doc::parse_match_document;
use cricsummary::queries::{self, ReportQuery};
use cricsummary::report;
use cricsummary::store::{self, DeliveryRow, MatchRow};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn empty_schema_skips_every_chart() {
    let conn = store::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let summary = report::render_all(&conn, dir.path()).unwrap();

    assert_eq!(summary.charts_written, 0);
    assert_eq!(summary.charts_skipped, 18);
    assert!(summary.errors.is_empty());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn full_report_renders_charts_from_ingested_fixture() {
    let mut conn = store::open_in_memory().unwrap();
    let doc = parse_match_document(&read_fixture("odi_full.json")).unwrap();
    load_match_document(&mut conn, &doc).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let summary = report::render_all(&conn, dir.path()).unwrap();

    // One ODI has no Test matches, no centuries and nobody past 50 balls
    // faced, so those three charts skip.
    assert_eq!(summary.charts_written, 15);
    assert_eq!(summary.charts_skipped, 3);
    assert!(summary.errors.is_empty(), "errors: {:?}", summary.errors);

    assert!(dir.path().join("1_top_10_batsmen.png").exists());
    assert!(dir.path().join("3_wicket_types.png").exists());
    assert!(dir.path().join("12_runs_per_over.png").exists());
    assert!(dir.path().join("18_toss_decision_wins.png").exists());

    assert!(!dir.path().join("8_test_win_percentage.png").exists());
    assert!(!dir.path().join("14_centuries_per_player.png").exists());
    assert!(!dir.path().join("15_strike_rate.png").exists());
}

fn toss_match(match_id: &str, outcome_winner: &str) -> MatchRow {
    MatchRow {
        match_id: match_id.to_string(),
        toss_winner: Some("Australia".to_string()),
        toss_decision: Some("bat".to_string()),
        outcome_winner: Some(outcome_winner.to_string()),
        ..Default::default()
    }
}

#[test]
fn toss_win_percentage_reflects_converted_tosses() {
    let conn = store::open_in_memory().unwrap();
    store::upsert_match(&conn, &toss_match("m1", "Australia")).unwrap();
    store::upsert_match(&conn, &toss_match("m2", "Australia")).unwrap();
    store::upsert_match(&conn, &toss_match("m3", "India")).unwrap();

    let table = queries::run_query(&conn, ReportQuery::TossWinAnalysis).unwrap();
    assert_eq!(table.rows.len(), 1);

    // Two of three toss wins converted into match wins.
    let pairs = table.label_values(0, 2);
    assert_eq!(pairs[0].0, "Australia");
    assert!((pairs[0].1 - 200.0 / 3.0).abs() < 0.05);

    let wins = queries::run_query(&conn, ReportQuery::TossDecisionWins).unwrap();
    let pairs = wins.label_values(0, 1);
    assert_eq!(pairs, vec![("bat".to_string(), 2.0)]);
}

#[test]
fn century_query_needs_a_hundred_in_one_inning() {
    let conn = store::open_in_memory().unwrap();
    store::upsert_player(&conn, "cent01", "Centurion").unwrap();
    store::upsert_match(
        &conn,
        &MatchRow {
            match_id: "m-cent".to_string(),
            match_type: Some("ODI".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let inning_id = store::insert_inning(&conn, "m-cent", 1, Some("Australia")).unwrap();
    let over_db_id = store::insert_over(&conn, inning_id, 0).unwrap();

    // 17 sixes: 102 runs inside a single inning.
    for ball in 1..=17 {
        store::insert_delivery(
            &conn,
            &DeliveryRow {
                over_db_id,
                delivery_number: ball,
                batter_id: Some("cent01".to_string()),
                runs_batter: 6,
                runs_total: 6,
                ..Default::default()
            },
        )
        .unwrap();
    }

    let table = queries::run_query(&conn, ReportQuery::CenturyCountPerPlayer).unwrap();
    let pairs = table.label_values(0, 1);
    assert_eq!(pairs, vec![("Centurion".to_string(), 1.0)]);
}

#[test]
fn boundary_counts_come_from_fixture_deliveries() {
    let mut conn = store::open_in_memory().unwrap();
    let doc = parse_match_document(&read_fixture("odi_full.json")).unwrap();
    load_match_document(&mut conn, &doc).unwrap();

    let table = queries::run_query(&conn, ReportQuery::TopBoundaryHitters).unwrap();
    let total: f64 = table.label_values(0, 1).iter().map(|(_, v)| v).sum();
    // One four from Warner, a six from Sharma and a four from Kohli.
    assert_eq!(total, 3.0);
}
