use std::path::PathBuf;

pub const DEFAULT_ARCHIVE_URL: &str = "https://cricsheet.org/downloads/all_json.zip";
const DEFAULT_DATA_DIR: &str = "cricket_data_json";
const DEFAULT_DB_PATH: &str = "cricket.sqlite3";
const DEFAULT_CHARTS_DIR: &str = "visualizations";

/// Runtime settings for the three pipeline stages. Built once in each
/// binary and passed down; no stage reads the environment on its own.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub archive_url: String,
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub charts_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::dotenv();
        Self {
            archive_url: env_or("CRIC_ARCHIVE_URL", DEFAULT_ARCHIVE_URL),
            data_dir: PathBuf::from(env_or("CRIC_DATA_DIR", DEFAULT_DATA_DIR)),
            db_path: PathBuf::from(env_or("CRIC_DB_PATH", DEFAULT_DB_PATH)),
            charts_dir: PathBuf::from(env_or("CRIC_CHARTS_DIR", DEFAULT_CHARTS_DIR)),
        }
    }

    /// Command-line flags win over environment values.
    pub fn apply_cli_overrides(&mut self, args: &[String]) {
        if let Some(url) = flag_value(args, "--archive-url") {
            self.archive_url = url;
        }
        if let Some(dir) = flag_value(args, "--data-dir") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = flag_value(args, "--db") {
            self.db_path = PathBuf::from(path);
        }
        if let Some(dir) = flag_value(args, "--charts-dir") {
            self.charts_dir = PathBuf::from(dir);
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
        _ => default.to_string(),
    }
}

/// Accepts both `--flag=value` and `--flag value`.
pub fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

pub fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}
