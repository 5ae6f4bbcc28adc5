use anyhow::Result;

use cricsummary::config::AppConfig;
use cricsummary::report;
use cricsummary::store;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = AppConfig::from_env();
    config.apply_cli_overrides(&args);

    let conn = store::open_db(&config.db_path)?;
    let summary = report::render_all(&conn, &config.charts_dir)?;

    println!("Report complete");
    println!("DB: {}", config.db_path.display());
    println!("Charts dir: {}", config.charts_dir.display());
    println!("Charts written: {}", summary.charts_written);
    println!("Charts skipped: {}", summary.charts_skipped);
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    Ok(())
}
