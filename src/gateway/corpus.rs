use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::debug;

use crate::constants::CORPUS_COLUMNS;
use crate::error::Result;
use crate::gateway::ensure_parent;
use crate::types::PoemRecord;

/// Create the corpus with its header row unless a non-empty file is already there.
pub fn ensure_header(path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let empty = match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };
    if empty {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CORPUS_COLUMNS)?;
        writer.flush()?;
    }
    Ok(())
}

/// Append rows and fsync before returning. Nothing is ever rewritten in place.
pub fn append_records(path: &Path, records: &[PoemRecord]) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    for record in records {
        writer.serialize(record)?;
    }
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RawCorpusRow {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    lines: String,
    #[serde(default)]
    views: String,
    #[serde(default)]
    source_page: String,
}

/// Load the classification pool from a corpus file.
///
/// Skips rows without title or link, "Sponsored Links" rows and rows whose line count
/// is not a plain integer. Views that are not a plain integer become 0. A link is kept
/// only at its first occurrence.
pub fn load_pool(path: &Path) -> Result<Vec<PoemRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<RawCorpusRow>() {
        let row = row?;
        let title = row.title.trim();
        let link = row.link.trim();
        if title.is_empty() || link.is_empty() || title.starts_with("Sponsored Links") {
            skipped += 1;
            continue;
        }
        let Some(line_count) = parse_plain_int::<u32>(&row.lines) else {
            skipped += 1;
            continue;
        };
        if !seen.insert(link.to_string()) {
            skipped += 1;
            continue;
        }
        out.push(PoemRecord {
            title: title.to_string(),
            link: link.to_string(),
            line_count,
            view_count: parse_plain_int(&row.views).unwrap_or(0),
            source_page: parse_plain_int(&row.source_page).unwrap_or(0),
        });
    }

    debug!(kept = out.len(), skipped, "loaded corpus pool from {}", path.display());
    Ok(out)
}

fn parse_plain_int<T: std::str::FromStr>(raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
