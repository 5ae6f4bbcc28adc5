use anyhow::Result;

use cricsummary::config::AppConfig;
use cricsummary::ingest;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = AppConfig::from_env();
    config.apply_cli_overrides(&args);

    let summary = ingest::ingest_dir(&config.db_path, &config.data_dir)?;

    println!("Ingest complete");
    println!("DB: {}", config.db_path.display());
    println!("Data dir: {}", config.data_dir.display());
    println!("Files loaded: {}/{}", summary.files_loaded, summary.files_total);
    println!("Matches upserted: {}", summary.matches_upserted);
    println!("Players upserted: {}", summary.players_upserted);
    println!("Deliveries inserted: {}", summary.deliveries_inserted);
    if summary.unresolved_names > 0 {
        println!("Unresolved player names: {}", summary.unresolved_names);
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    Ok(())
}
