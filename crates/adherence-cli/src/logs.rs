//! Dose log decoding
//!
//! Reads intake-log exports: either a single JSON file holding an array of
//! records, or a directory tree of such files (decoded in parallel).

use adherence_core::{DoseLogEntry, Identifier};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rayon::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Record as exported by the tracker API. Accepts both the camelCase shape
/// and the snake_case shape of the intake-log endpoint.
#[derive(Debug, Deserialize)]
struct RawDoseLog {
    id: Identifier,
    #[serde(
        rename = "medicationId",
        alias = "medication_id",
        alias = "user_medication_id"
    )]
    medication_id: Identifier,
    #[serde(rename = "takenAt", alias = "taken_at")]
    taken_at: RawInstant,
    #[serde(default)]
    note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInstant {
    Millis(i64),
    Text(String),
}

impl RawDoseLog {
    fn into_entry(self) -> Option<DoseLogEntry> {
        let taken_at = match self.taken_at {
            RawInstant::Millis(ms) => DateTime::from_timestamp_millis(ms)?,
            RawInstant::Text(text) => parse_instant(&text)?,
        };

        Some(DoseLogEntry {
            id: normalize_id(self.id),
            medication_id: normalize_id(self.medication_id),
            taken_at,
            note: self.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

fn normalize_id(id: Identifier) -> Identifier {
    match id {
        Identifier::Text(text) => match text.parse::<Identifier>() {
            Ok(id) => id,
            Err(never) => match never {},
        },
        other => other,
    }
}

/// Parse an instant given as RFC 3339, a naive ISO datetime (taken as UTC),
/// or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Load every dose log under `path`.
///
/// A file must decode; inside a directory, files that fail to read or decode
/// are skipped with a warning.
pub fn load_logs(path: &Path) -> Result<Vec<DoseLogEntry>> {
    if !path.exists() {
        anyhow::bail!("dose log path {} does not exist", path.display());
    }

    if !path.is_dir() {
        return decode_file(path);
    }

    let files = scan_log_files(path);
    debug!(root = %path.display(), files = files.len(), "scanned dose log directory");

    let logs: Vec<DoseLogEntry> = files
        .par_iter()
        .flat_map(|file| match decode_file(file) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("skipping {}: {:#}", file.display(), err);
                Vec::new()
            }
        })
        .collect();

    Ok(logs)
}

/// Sorted list of `*.json` files below `root`.
fn scan_log_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();

    files.sort();
    files
}

fn decode_file(path: &Path) -> Result<Vec<DoseLogEntry>> {
    let mut bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_slice(&mut bytes).with_context(|| format!("failed to decode {}", path.display()))
}

pub fn decode_slice(bytes: &mut [u8]) -> Result<Vec<DoseLogEntry>> {
    let records: Vec<RawDoseLog> = simd_json::from_slice(bytes)?;
    let total = records.len();

    let entries: Vec<DoseLogEntry> = records
        .into_iter()
        .filter_map(RawDoseLog::into_entry)
        .collect();

    if entries.len() < total {
        warn!(
            skipped = total - entries.len(),
            "skipped dose logs with unreadable timestamps"
        );
    }

    Ok(entries)
}
