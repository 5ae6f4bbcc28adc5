use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use plotters::style::RGBColor;
use rusqlite::Connection;

use crate::charts;
use crate::queries::{self, QueryTable, ReportQuery};

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const CORAL: RGBColor = RGBColor(255, 127, 80);
const PURPLE: RGBColor = RGBColor(128, 0, 128);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);

#[derive(Debug, Clone, Default)]
pub struct ReportSummary {
    pub charts_written: usize,
    pub charts_skipped: usize,
    pub errors: Vec<String>,
}

/// Renders the full chart set into `charts_dir`. Empty query results skip
/// their chart with a log line; rendering failures are collected and the
/// run moves on to the next chart.
pub fn render_all(conn: &Connection, charts_dir: &Path) -> Result<ReportSummary> {
    fs::create_dir_all(charts_dir)
        .with_context(|| format!("create charts dir {}", charts_dir.display()))?;
    let mut summary = ReportSummary::default();

    let table = queries::fetch_or_empty(conn, ReportQuery::TopBatsmen);
    if table.is_empty() {
        skip(&mut summary, "1_top_10_batsmen.png");
    } else {
        record(
            &mut summary,
            "1_top_10_batsmen.png",
            charts::vertical_bars(
                &charts_dir.join("1_top_10_batsmen.png"),
                "Top 10 Batsmen by Total Runs",
                "Player Name",
                "Total Runs",
                &table.label_values(0, 1),
                SKY_BLUE,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TopBowlers);
    if table.is_empty() {
        skip(&mut summary, "2_top_10_bowlers.png");
    } else {
        record(
            &mut summary,
            "2_top_10_bowlers.png",
            charts::horizontal_bars(
                &charts_dir.join("2_top_10_bowlers.png"),
                "Top 10 Wicket-Takers",
                "Total Wickets",
                "Player Name",
                &table.label_values(0, 1),
                charts::palette_color(0),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::DismissalTypes);
    if table.is_empty() {
        skip(&mut summary, "3_wicket_types.png");
    } else {
        record(
            &mut summary,
            "3_wicket_types.png",
            charts::pie(
                &charts_dir.join("3_wicket_types.png"),
                "Distribution of Wicket Types",
                &table.label_values(0, 1),
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::MatchesPerVenue);
    if table.is_empty() {
        skip(&mut summary, "4_matches_per_venue.png");
    } else {
        record(
            &mut summary,
            "4_matches_per_venue.png",
            charts::horizontal_bars(
                &charts_dir.join("4_matches_per_venue.png"),
                "Total Matches Played per Venue",
                "Total Matches Played",
                "Venue Name",
                &table.label_values(0, 1),
                CORAL,
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TossWinAnalysis);
    if table.is_empty() {
        skip(&mut summary, "5_toss_win_percentage.png");
    } else {
        record(
            &mut summary,
            "5_toss_win_percentage.png",
            charts::horizontal_bars(
                &charts_dir.join("5_toss_win_percentage.png"),
                "Win Percentage After Winning the Toss",
                "Win Percentage (%)",
                "Team Name",
                &table.label_values(0, 2),
                charts::palette_color(1),
                Some(100.0),
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::PomAwards);
    if table.is_empty() {
        skip(&mut summary, "6_pom_awards.png");
    } else {
        record(
            &mut summary,
            "6_pom_awards.png",
            charts::horizontal_bars(
                &charts_dir.join("6_pom_awards.png"),
                "Most \"Player of the Match\" Awards",
                "Number of Player of the Match Awards",
                "Player Name",
                &table.label_values(0, 1),
                charts::palette_color(2),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::OdiBatsmen);
    if table.is_empty() {
        skip(&mut summary, "7_top_5_odi_batsmen.png");
    } else {
        record(
            &mut summary,
            "7_top_5_odi_batsmen.png",
            charts::vertical_bars(
                &charts_dir.join("7_top_5_odi_batsmen.png"),
                "Top 5 Run-Scorers in ODI Matches",
                "Player Name",
                "Total Runs",
                &table.label_values(0, 1),
                PURPLE,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TestWinPercentage);
    if table.is_empty() {
        skip(&mut summary, "8_test_win_percentage.png");
    } else {
        record(
            &mut summary,
            "8_test_win_percentage.png",
            charts::horizontal_bars(
                &charts_dir.join("8_test_win_percentage.png"),
                "Team Win Percentage in Test Cricket",
                "Win Percentage (%)",
                "Team Name",
                &table.label_values(0, 1),
                charts::palette_color(3),
                Some(100.0),
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::MostCommonMatchType);
    if table.is_empty() {
        skip(&mut summary, "9_match_type_distribution.png");
    } else {
        record(
            &mut summary,
            "9_match_type_distribution.png",
            charts::pie(
                &charts_dir.join("9_match_type_distribution.png"),
                "Distribution of Match Types",
                &table.label_values(0, 1),
            ),
        );
    }

    // The per-inning-number grouping is awkward in SQL against this
    // schema, so two flat results are joined and averaged here instead.
    let runs = queries::fetch_or_empty(conn, ReportQuery::TotalRunsPerInningId);
    let numbers = queries::fetch_or_empty(conn, ReportQuery::InningNumbers);
    let averages = average_score_by_inning(&runs, &numbers);
    if averages.is_empty() {
        skip(&mut summary, "10_average_score_by_inning.png");
    } else {
        record(
            &mut summary,
            "10_average_score_by_inning.png",
            charts::vertical_bars(
                &charts_dir.join("10_average_score_by_inning.png"),
                "Average Score by Inning",
                "Inning Number",
                "Average Score",
                &averages,
                LIGHT_GREEN,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TeamHomeAwayWins);
    if table.is_empty() {
        skip(&mut summary, "11_total_wins_per_team.png");
    } else {
        record(
            &mut summary,
            "11_total_wins_per_team.png",
            charts::horizontal_bars(
                &charts_dir.join("11_total_wins_per_team.png"),
                "Total Wins per Team",
                "Number of Wins",
                "Team Name",
                &table.label_values(0, 1),
                charts::palette_color(4),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::RunsPerOver);
    let series = runs_per_over_series(&table);
    if series.is_empty() {
        skip(&mut summary, "12_runs_per_over.png");
    } else {
        record(
            &mut summary,
            "12_runs_per_over.png",
            charts::multi_line(
                &charts_dir.join("12_runs_per_over.png"),
                "Runs Scored Per Over by Inning",
                "Over Number",
                "Runs Scored",
                &series,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TopWicketTakersOdi);
    if table.is_empty() {
        skip(&mut summary, "13_top_odi_bowlers.png");
    } else {
        record(
            &mut summary,
            "13_top_odi_bowlers.png",
            charts::horizontal_bars(
                &charts_dir.join("13_top_odi_bowlers.png"),
                "Top 10 Wicket Takers in ODI Matches",
                "Total Wickets",
                "Player Name",
                &table.label_values(0, 1),
                charts::palette_color(5),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::CenturyCountPerPlayer);
    if table.is_empty() {
        skip(&mut summary, "14_centuries_per_player.png");
    } else {
        record(
            &mut summary,
            "14_centuries_per_player.png",
            charts::horizontal_bars(
                &charts_dir.join("14_centuries_per_player.png"),
                "Number of Centuries per Player",
                "Number of Centuries",
                "Player Name",
                &table.label_values(0, 1),
                charts::palette_color(6),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::AverageStrikeRatePerPlayer);
    if table.is_empty() {
        skip(&mut summary, "15_strike_rate.png");
    } else {
        record(
            &mut summary,
            "15_strike_rate.png",
            charts::horizontal_bars(
                &charts_dir.join("15_strike_rate.png"),
                "Top 10 Players by Average Strike Rate",
                "Average Strike Rate",
                "Player Name",
                &table.label_values(0, 1),
                charts::palette_color(7),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TotalRunsPerSeason);
    if table.is_empty() {
        skip(&mut summary, "16_runs_per_season.png");
    } else {
        record(
            &mut summary,
            "16_runs_per_season.png",
            charts::line_over_categories(
                &charts_dir.join("16_runs_per_season.png"),
                "Total Runs Scored Per Season",
                "Season",
                "Total Runs Scored",
                &table.label_values(0, 1),
                PURPLE,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TopBoundaryHitters);
    if table.is_empty() {
        skip(&mut summary, "17_top_boundary_hitters.png");
    } else {
        record(
            &mut summary,
            "17_top_boundary_hitters.png",
            charts::horizontal_bars(
                &charts_dir.join("17_top_boundary_hitters.png"),
                "Top 10 Boundary Hitters",
                "Total Boundaries (4s & 6s)",
                "Player Name",
                &table.label_values(0, 1),
                charts::palette_color(8),
                None,
            ),
        );
    }

    let table = queries::fetch_or_empty(conn, ReportQuery::TossDecisionWins);
    if table.is_empty() {
        skip(&mut summary, "18_toss_decision_wins.png");
    } else {
        record(
            &mut summary,
            "18_toss_decision_wins.png",
            charts::pie(
                &charts_dir.join("18_toss_decision_wins.png"),
                "Wins by Toss Decision",
                &table.label_values(0, 1),
            ),
        );
    }

    Ok(summary)
}

/// Joins per-inning run totals with inning ordinals and averages the
/// totals per ordinal. Innings absent from either side drop out.
fn average_score_by_inning(
    runs_per_inning: &QueryTable,
    inning_numbers: &QueryTable,
) -> Vec<(String, f64)> {
    let mut ordinal_by_inning: BTreeMap<i64, i64> = BTreeMap::new();
    for row in &inning_numbers.rows {
        if let (Some(inning_id), Some(number)) = (
            row.first().and_then(|c| c.as_i64()),
            row.get(1).and_then(|c| c.as_i64()),
        ) {
            ordinal_by_inning.insert(inning_id, number);
        }
    }

    let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for row in &runs_per_inning.rows {
        let Some(inning_id) = row.first().and_then(|c| c.as_i64()) else {
            continue;
        };
        let Some(total) = row.get(1).and_then(|c| c.as_f64()) else {
            continue;
        };
        let Some(number) = ordinal_by_inning.get(&inning_id) else {
            continue;
        };
        let entry = sums.entry(*number).or_insert((0.0, 0));
        entry.0 += total;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(number, (sum, count))| (number.to_string(), sum / count as f64))
        .collect()
}

/// Splits (inning_number, over_number, runs) rows into one line series
/// per inning ordinal.
fn runs_per_over_series(table: &QueryTable) -> Vec<(String, Vec<(i64, f64)>)> {
    let mut by_inning: BTreeMap<i64, Vec<(i64, f64)>> = BTreeMap::new();
    for row in &table.rows {
        let (Some(inning), Some(over), Some(runs)) = (
            row.first().and_then(|c| c.as_i64()),
            row.get(1).and_then(|c| c.as_i64()),
            row.get(2).and_then(|c| c.as_f64()),
        ) else {
            continue;
        };
        by_inning.entry(inning).or_default().push((over, runs));
    }
    by_inning
        .into_iter()
        .map(|(inning, points)| (format!("Inning {inning}"), points))
        .collect()
}

fn skip(summary: &mut ReportSummary, file: &str) {
    info!("Skipping {file}: no rows to plot");
    summary.charts_skipped += 1;
}

fn record(summary: &mut ReportSummary, file: &str, result: Result<()>) {
    match result {
        Ok(()) => {
            info!("Wrote {file}");
            summary.charts_written += 1;
        }
        Err(err) => {
            warn!("Chart {file} failed: {err:#}");
            summary.errors.push(format!("{file}: {err:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::Cell;

    fn table(columns: &[&str], rows: Vec<Vec<Cell>>) -> QueryTable {
        QueryTable {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn average_score_joins_and_averages() {
        let runs = table(
            &["inning_id", "total_runs"],
            vec![
                vec![Cell::Int(1), Cell::Int(200)],
                vec![Cell::Int(2), Cell::Int(100)],
                vec![Cell::Int(3), Cell::Int(300)],
            ],
        );
        // Innings 1 and 3 are both first innings; 2 is a second innings.
        let numbers = table(
            &["inning_id", "inning_number"],
            vec![
                vec![Cell::Int(1), Cell::Int(1)],
                vec![Cell::Int(2), Cell::Int(2)],
                vec![Cell::Int(3), Cell::Int(1)],
            ],
        );
        let averages = average_score_by_inning(&runs, &numbers);
        assert_eq!(
            averages,
            vec![("1".to_string(), 250.0), ("2".to_string(), 100.0)]
        );
    }

    #[test]
    fn average_score_drops_unmatched_innings() {
        let runs = table(
            &["inning_id", "total_runs"],
            vec![vec![Cell::Int(9), Cell::Int(50)]],
        );
        let numbers = table(&["inning_id", "inning_number"], vec![]);
        assert!(average_score_by_inning(&runs, &numbers).is_empty());
    }

    #[test]
    fn runs_per_over_groups_by_inning() {
        let rows = table(
            &["inning_number", "over_number", "runs_scored"],
            vec![
                vec![Cell::Int(1), Cell::Int(0), Cell::Int(6)],
                vec![Cell::Int(1), Cell::Int(1), Cell::Int(2)],
                vec![Cell::Int(2), Cell::Int(0), Cell::Int(10)],
            ],
        );
        let series = runs_per_over_series(&rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].0, "Inning 1");
        assert_eq!(series[0].1, vec![(0, 6.0), (1, 2.0)]);
        assert_eq!(series[1].0, "Inning 2");
        assert_eq!(series[1].1, vec![(0, 10.0)]);
    }
}
