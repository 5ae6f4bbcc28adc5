use anyhow::Result;
use log::{error, info, warn};

use cricsummary::archive_fetch;
use cricsummary::config::{self, AppConfig};
use cricsummary::ingest;
use cricsummary::report;
use cricsummary::store;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = AppConfig::from_env();
    config.apply_cli_overrides(&args);

    if config::has_flag(&args, "--skip-fetch") {
        info!("Skipping archive download");
    } else {
        run_fetch(&config);
    }

    if config::has_flag(&args, "--skip-load") {
        info!("Skipping document load");
    } else {
        let loaded = ingest::ingest_dir(&config.db_path, &config.data_dir)?;
        println!("Ingest complete");
        println!("  DB: {}", config.db_path.display());
        println!("  Files loaded: {}/{}", loaded.files_loaded, loaded.files_total);
        println!("  Players upserted: {}", loaded.players_upserted);
        println!("  Deliveries inserted: {}", loaded.deliveries_inserted);
        if loaded.unresolved_names > 0 {
            println!("  Unresolved player names: {}", loaded.unresolved_names);
        }
        if !loaded.errors.is_empty() {
            println!("  Errors: {}", loaded.errors.len());
            for err in loaded.errors.iter().take(6) {
                println!("   - {err}");
            }
        }
    }

    if config::has_flag(&args, "--skip-charts") {
        info!("Skipping chart rendering");
    } else {
        let conn = store::open_db(&config.db_path)?;
        let rendered = report::render_all(&conn, &config.charts_dir)?;
        println!("Report complete");
        println!("  Charts dir: {}", config.charts_dir.display());
        println!("  Charts written: {}", rendered.charts_written);
        println!("  Charts skipped: {}", rendered.charts_skipped);
        if !rendered.errors.is_empty() {
            println!("  Errors: {}", rendered.errors.len());
            for err in rendered.errors.iter().take(6) {
                println!("   - {err}");
            }
        }
    }

    Ok(())
}

// A failed download leaves whatever documents a previous run extracted,
// so the pipeline keeps going instead of aborting.
fn run_fetch(config: &AppConfig) {
    match archive_fetch::download_and_extract(&config.archive_url, &config.data_dir) {
        Ok(fetched) => {
            println!("Archive fetch complete");
            println!("  URL: {}", config.archive_url);
            println!("  Bytes: {}", fetched.archive_bytes);
            println!(
                "  Files written: {} ({} skipped)",
                fetched.files_written, fetched.entries_skipped
            );
            match archive_fetch::sample_document(&config.data_dir) {
                Ok(Some(sample)) => info!(
                    "Sample document {}: type={} teams={:?} date={}",
                    sample.file_name,
                    sample.match_type.as_deref().unwrap_or("n/a"),
                    sample.teams,
                    sample.first_date.as_deref().unwrap_or("n/a")
                ),
                Ok(None) => warn!("No documents found after extraction"),
                Err(err) => warn!("Sample document check failed: {err:#}"),
            }
        }
        Err(err) => {
            error!("Archive fetch failed: {err:#}");
        }
    }
}
