use anyhow::Result;

use cricsummary::archive_fetch;
use cricsummary::config::AppConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut config = AppConfig::from_env();
    config.apply_cli_overrides(&args);

    let summary = archive_fetch::download_and_extract(&config.archive_url, &config.data_dir)?;

    println!("Archive fetch complete");
    println!("URL: {}", config.archive_url);
    println!("Data dir: {}", config.data_dir.display());
    println!("Bytes downloaded: {}", summary.archive_bytes);
    println!(
        "Files written: {} ({} skipped)",
        summary.files_written, summary.entries_skipped
    );

    match archive_fetch::sample_document(&config.data_dir)? {
        Some(sample) => println!(
            "Sample document {}: type={} teams={:?} date={}",
            sample.file_name,
            sample.match_type.as_deref().unwrap_or("n/a"),
            sample.teams,
            sample.first_date.as_deref().unwrap_or("n/a")
        ),
        None => println!("No documents found after extraction"),
    }

    Ok(())
}
