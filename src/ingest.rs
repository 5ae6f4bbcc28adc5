use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use rusqlite::{Connection, params};

use crate::archive_fetch;
use crate::match_doc::{DeliveryRecord, MatchDocument, PlayerRegistry, parse_match_document};
use crate::store::{self, DeliveryRow, MatchRow};

/// Row counts produced by loading one document.
#[derive(Debug, Clone, Default)]
pub struct MatchLoadSummary {
    pub match_id: String,
    pub players: usize,
    pub teams: usize,
    pub squad_members: usize,
    pub officials: usize,
    pub awards: usize,
    pub innings: usize,
    pub overs: usize,
    pub deliveries: usize,
    pub unresolved_names: usize,
}

/// Outcome of a whole directory pass. Per-file failures land in `errors`
/// instead of aborting the run.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub files_total: usize,
    pub files_loaded: usize,
    pub matches_upserted: usize,
    pub players_upserted: usize,
    pub deliveries_inserted: usize,
    pub unresolved_names: usize,
    pub errors: Vec<String>,
}

/// Flattens one parsed document into the schema, committing group by
/// group: players, match, teams, squads, officials, awards, then the
/// innings tree. Parent rows are durable before their children are
/// built, so a mid-document failure keeps every group committed so far.
pub fn load_match_document(
    conn: &mut Connection,
    doc: &MatchDocument,
) -> Result<MatchLoadSummary> {
    let match_id = doc.match_id();
    let registry = &doc.info.registry;
    let mut summary = MatchLoadSummary {
        match_id: match_id.clone(),
        ..MatchLoadSummary::default()
    };

    let tx = conn.transaction().context("begin players transaction")?;
    for (name, player_id) in registry.entries() {
        store::upsert_player(&tx, player_id, name)?;
        summary.players += 1;
    }
    tx.commit().context("commit players")?;

    store::upsert_match(conn, &match_row(doc, &match_id))?;

    let tx = conn.transaction().context("begin teams transaction")?;
    for team_name in &doc.info.teams {
        store::insert_match_team(&tx, &match_id, team_name)?;
        summary.teams += 1;
    }
    tx.commit().context("commit teams")?;

    let tx = conn.transaction().context("begin squads transaction")?;
    for (team_name, player_names) in &doc.info.players {
        for player_name in player_names {
            let Some(player_id) = registry.player_id(player_name) else {
                warn!("Squad player '{player_name}' not in registry for match {match_id}; skipping");
                summary.unresolved_names += 1;
                continue;
            };
            store::insert_squad_member(&tx, &match_id, team_name, player_id)?;
            summary.squad_members += 1;
        }
    }
    tx.commit().context("commit squads")?;

    let tx = conn.transaction().context("begin officials transaction")?;
    for (role, names) in &doc.info.officials {
        for name in names {
            let Some(player_id) = registry.player_id(name) else {
                warn!("Official '{name}' not in registry for match {match_id}; skipping");
                summary.unresolved_names += 1;
                continue;
            };
            store::insert_official(&tx, &match_id, player_id, role)?;
            summary.officials += 1;
        }
    }
    tx.commit().context("commit officials")?;

    let tx = conn.transaction().context("begin awards transaction")?;
    for name in &doc.info.player_of_match {
        let Some(player_id) = registry.player_id(name) else {
            warn!("Player of match '{name}' not in registry for match {match_id}; skipping");
            summary.unresolved_names += 1;
            continue;
        };
        store::insert_award(&tx, &match_id, player_id)?;
        summary.awards += 1;
    }
    tx.commit().context("commit awards")?;

    for (inning_index, inning) in doc.innings.iter().enumerate() {
        let inning_number = inning_index as i64 + 1;
        let inning_id =
            store::insert_inning(conn, &match_id, inning_number, inning.team.as_deref())?;
        summary.innings += 1;

        for over in &inning.overs {
            let over_id = store::insert_over(conn, inning_id, over.over)?;
            summary.overs += 1;

            let tx = conn.transaction().context("begin deliveries transaction")?;
            for (delivery_index, delivery) in over.deliveries.iter().enumerate() {
                let row = delivery_row(
                    over_id,
                    delivery_index as i64 + 1,
                    delivery,
                    registry,
                    &match_id,
                    &mut summary.unresolved_names,
                );
                store::insert_delivery(&tx, &row)?;
                summary.deliveries += 1;
            }
            tx.commit().context("commit deliveries")?;
        }
    }

    Ok(summary)
}

/// Loads one document file over its own connection, released when the
/// pass ends whether or not it succeeded.
pub fn ingest_file(db_path: &Path, file_path: &Path) -> Result<MatchLoadSummary> {
    let raw = fs::read_to_string(file_path)
        .with_context(|| format!("read {}", file_path.display()))?;
    let doc = parse_match_document(&raw)
        .with_context(|| format!("parse {}", file_path.display()))?;
    let mut conn = store::open_db(db_path)?;
    load_match_document(&mut conn, &doc)
}

/// Loads every `*.json` document under `data_dir` in name order, one
/// connection per document. A bookkeeping row in `ingest_runs` records
/// the pass and its collected errors.
pub fn ingest_dir(db_path: &Path, data_dir: &Path) -> Result<IngestSummary> {
    let mut names = archive_fetch::json_file_names(data_dir)?;
    names.sort();

    let ledger = store::open_db(db_path)?;
    let started_at = Utc::now().to_rfc3339();
    ledger
        .execute(
            "INSERT INTO ingest_runs(started_at, finished_at, files_total, files_loaded, matches_upserted, deliveries_inserted, errors_json)
             VALUES (?1, NULL, ?2, 0, 0, 0, '[]')",
            params![started_at, names.len() as i64],
        )
        .context("insert ingest run")?;
    let run_id = ledger.last_insert_rowid();

    let mut summary = IngestSummary {
        files_total: names.len(),
        ..IngestSummary::default()
    };
    for name in &names {
        let path = data_dir.join(name);
        match ingest_file(db_path, &path) {
            Ok(loaded) => {
                info!(
                    "Loaded {name}: match {} ({} innings, {} deliveries)",
                    loaded.match_id, loaded.innings, loaded.deliveries
                );
                summary.files_loaded += 1;
                summary.matches_upserted += 1;
                summary.players_upserted += loaded.players;
                summary.deliveries_inserted += loaded.deliveries;
                summary.unresolved_names += loaded.unresolved_names;
            }
            Err(err) => {
                warn!("Skipping {name}: {err:#}");
                summary.errors.push(format!("{name}: {err:#}"));
            }
        }
    }

    let finished_at = Utc::now().to_rfc3339();
    let errors_json =
        serde_json::to_string(&summary.errors).unwrap_or_else(|_| "[]".to_string());
    ledger
        .execute(
            "UPDATE ingest_runs
             SET finished_at = ?1, files_loaded = ?2, matches_upserted = ?3,
                 deliveries_inserted = ?4, errors_json = ?5
             WHERE run_id = ?6",
            params![
                finished_at,
                summary.files_loaded as i64,
                summary.matches_upserted as i64,
                summary.deliveries_inserted as i64,
                errors_json,
                run_id
            ],
        )
        .context("update ingest run")?;

    Ok(summary)
}

fn match_row(doc: &MatchDocument, match_id: &str) -> MatchRow {
    let info = &doc.info;
    let outcome = info.outcome.as_ref();
    let outcome_by = outcome.and_then(|o| o.by.as_ref());
    MatchRow {
        match_id: match_id.to_string(),
        data_version: doc.meta.data_version.clone(),
        created_date: doc.meta.created.clone(),
        revision: doc.meta.revision,
        balls_per_over: info.balls_per_over,
        city: info.city.clone(),
        start_date: info.first_date().map(str::to_string),
        end_date: info.last_date().map(str::to_string),
        event_name: info.event.as_ref().and_then(|e| e.name.clone()),
        event_match_number: info.event.as_ref().and_then(|e| e.match_number),
        gender: info.gender.clone(),
        match_type: info.match_type.clone(),
        match_type_number: info.match_type_number,
        outcome_winner: outcome.and_then(|o| o.winner.clone()),
        outcome_by_wickets: outcome_by.and_then(|b| b.wickets),
        outcome_by_runs: outcome_by.and_then(|b| b.runs),
        toss_decision: info.toss.as_ref().and_then(|t| t.decision.clone()),
        toss_winner: info.toss.as_ref().and_then(|t| t.winner.clone()),
        venue_name: info.venue.clone(),
        season: info.season.clone(),
        team_type: info.team_type.clone(),
    }
}

fn delivery_row(
    over_db_id: i64,
    delivery_number: i64,
    delivery: &DeliveryRecord,
    registry: &PlayerRegistry,
    match_id: &str,
    unresolved: &mut usize,
) -> DeliveryRow {
    let wicket = delivery.wicket.as_ref();
    DeliveryRow {
        over_db_id,
        delivery_number,
        batter_id: resolve(registry, "batter", delivery.batter.as_deref(), match_id, unresolved),
        bowler_id: resolve(registry, "bowler", delivery.bowler.as_deref(), match_id, unresolved),
        non_striker_id: resolve(
            registry,
            "non-striker",
            delivery.non_striker.as_deref(),
            match_id,
            unresolved,
        ),
        runs_batter: delivery.runs.batter,
        runs_extras: delivery.runs.extras,
        runs_total: delivery.runs.total,
        extras_wides: delivery.extras.wides,
        extras_noballs: delivery.extras.noballs,
        extras_byes: delivery.extras.byes,
        extras_legbyes: delivery.extras.legbyes,
        extras_penalty: delivery.extras.penalty,
        wicket_kind: wicket.and_then(|w| w.kind.clone()),
        wicket_player_out_id: wicket.and_then(|w| {
            resolve(registry, "player out", w.player_out.as_deref(), match_id, unresolved)
        }),
        wicket_fielders: wicket.and_then(|w| w.fielders_json()),
    }
}

// Unresolved names degrade to NULL so the delivery row is kept.
fn resolve(
    registry: &PlayerRegistry,
    role: &str,
    name: Option<&str>,
    match_id: &str,
    unresolved: &mut usize,
) -> Option<String> {
    let name = name?;
    match registry.player_id(name) {
        Some(id) => Some(id.to_string()),
        None => {
            warn!("Unresolved {role} '{name}' in match {match_id}; storing NULL");
            *unresolved += 1;
            None
        }
    }
}
