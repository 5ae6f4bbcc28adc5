use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use zip::ZipArchive;

use crate::match_doc;

// The full archive runs to several hundred MB, so the read timeout is far
// looser than the connect timeout.
const CONNECT_TIMEOUT_SECS: u64 = 15;
const DOWNLOAD_TIMEOUT_SECS: u64 = 600;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone)]
pub struct FetchSummary {
    pub archive_bytes: usize,
    pub files_written: usize,
    pub entries_skipped: usize,
}

/// First document found after extraction, read back as a smoke check.
#[derive(Debug, Clone)]
pub struct SampleDocument {
    pub file_name: String,
    pub match_type: Option<String>,
    pub teams: Vec<String>,
    pub first_date: Option<String>,
}

/// Downloads the archive fully into memory, validates it as a zip file and
/// extracts every entry into `data_dir`. One attempt, no retry; a failure
/// leaves behind only whatever files were already flushed.
pub fn download_and_extract(url: &str, data_dir: &Path) -> Result<FetchSummary> {
    info!("Downloading archive from {url}");
    let client = http_client()?;
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("download failed for {url}"))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("http {status} fetching {url}"));
    }
    let body = resp.bytes().context("failed reading archive body")?;
    info!("Download complete ({} bytes), extracting", body.len());

    let mut summary = extract_archive(&body, data_dir)?;
    summary.archive_bytes = body.len();
    info!(
        "Extraction complete: {} files into {}",
        summary.files_written,
        data_dir.display()
    );
    Ok(summary)
}

/// Extracts an in-memory zip archive into `data_dir`, creating the
/// directory if absent. Entries without a safe enclosed name are skipped.
pub fn extract_archive(bytes: &[u8], data_dir: &Path) -> Result<FetchSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .context("downloaded file is not a valid zip archive")?;
    fs::create_dir_all(data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;

    let mut files_written = 0usize;
    let mut entries_skipped = 0usize;
    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .with_context(|| format!("read zip entry {idx}"))?;
        let Some(rel_path) = entry.enclosed_name() else {
            warn!("Skipping zip entry with unsafe path: {}", entry.name());
            entries_skipped += 1;
            continue;
        };
        if entry.is_dir() {
            continue;
        }
        let dest = data_dir.join(&rel_path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let mut out = fs::File::create(&dest)
            .with_context(|| format!("create {}", dest.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("write {}", dest.display()))?;
        files_written += 1;
    }

    Ok(FetchSummary {
        archive_bytes: bytes.len(),
        files_written,
        entries_skipped,
    })
}

/// Reads the alphabetically first `*.json` document in the data directory
/// and returns a short description of it, or `None` when the directory has
/// no documents.
pub fn sample_document(data_dir: &Path) -> Result<Option<SampleDocument>> {
    let mut names = json_file_names(data_dir)?;
    names.sort();
    let Some(file_name) = names.into_iter().next() else {
        return Ok(None);
    };

    let path = data_dir.join(&file_name);
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read {}", path.display()))?;
    let doc = match_doc::parse_match_document(&raw)
        .with_context(|| format!("parse {}", path.display()))?;

    Ok(Some(SampleDocument {
        file_name,
        match_type: doc.info.match_type.clone(),
        teams: doc.info.teams.clone(),
        first_date: doc.info.first_date().map(str::to_string),
    }))
}

/// File names (not paths) of every `*.json` in the directory, unsorted.
pub fn json_file_names(data_dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(data_dir)
        .with_context(|| format!("read data dir {}", data_dir.display()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.context("read data dir entry")?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if name.ends_with(".json") {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
