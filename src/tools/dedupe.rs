use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::gateway::ensure_parent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DedupeReport {
    pub total: usize,
    pub kept: usize,
}

/// Copy `input` to `output` keeping the first row of every key. Keys are the trimmed
/// values of `key_columns`; the header and column order are preserved.
pub fn dedupe_csv(input: &Path, output: &Path, key_columns: &[String]) -> Result<DedupeReport> {
    let mut reader = csv::Reader::from_path(input)?;
    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(HarvestError::Config(format!("{} has no header row", input.display())));
    }

    let mut key_index = Vec::with_capacity(key_columns.len());
    let mut missing = Vec::new();
    for column in key_columns {
        match headers.iter().position(|h| h == column) {
            Some(i) => key_index.push(i),
            None => missing.push(column.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(HarvestError::MissingColumns(missing));
    }

    ensure_parent(output)?;
    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record(&headers)?;

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut report = DedupeReport { total: 0, kept: 0 };
    for record in reader.records() {
        let record = record?;
        report.total += 1;
        let key: Vec<String> = key_index
            .iter()
            .map(|&i| record.get(i).unwrap_or("").trim().to_string())
            .collect();
        if seen.insert(key) {
            writer.write_record(&record)?;
            report.kept += 1;
        }
    }
    writer.flush()?;

    info!("Kept {}/{} rows in {}", report.kept, report.total, output.display());
    Ok(report)
}

/// Deduplicate `path` itself through a sibling temp file and an atomic rename.
pub fn dedupe_in_place(path: &Path, key_columns: &[String]) -> Result<DedupeReport> {
    if !path.exists() {
        return Err(HarvestError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("input file not found: {}", path.display()),
        )));
    }
    let tmp = temp_path(path);
    let result = dedupe_csv(path, &tmp, key_columns).and_then(|report| {
        File::open(&tmp)?.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(report)
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".dedupe.tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CORPUS_COLUMNS;

    fn all_columns() -> Vec<String> {
        CORPUS_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    const CORPUS: &str = "title,link,lines,views,source_page\n\
                          A,https://x/a,10,5,1\n\
                          B,https://x/b,12,0,1\n\
                          A, https://x/a ,10,5,1\n\
                          A,https://x/a,10,6,2\n";

    #[test]
    fn test_whole_row_key_keeps_first_occurrence() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("poems.csv");
        let output = dir.path().join("out/deduped.csv");
        fs::write(&input, CORPUS).unwrap();

        let report = dedupe_csv(&input, &output, &all_columns()).unwrap();
        assert_eq!(report, DedupeReport { total: 4, kept: 3 });
        let text = fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "title,link,lines,views,source_page\nA,https://x/a,10,5,1\nB,https://x/b,12,0,1\nA,https://x/a,10,6,2\n"
        );
    }

    #[test]
    fn test_in_place_with_link_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poems.csv");
        fs::write(&path, CORPUS).unwrap();

        let report = dedupe_in_place(&path, &["link".to_string()]).unwrap();
        assert_eq!(report, DedupeReport { total: 4, kept: 2 });
        assert!(!dir.path().join("poems.csv.dedupe.tmp").exists());
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_unknown_key_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("poems.csv");
        fs::write(&path, CORPUS).unwrap();

        let err = dedupe_in_place(&path, &["link".to_string(), "author".to_string()]).unwrap_err();
        assert!(matches!(err, HarvestError::MissingColumns(ref cols) if cols == &vec!["author".to_string()]));
        assert_eq!(fs::read_to_string(&path).unwrap(), CORPUS);
        assert!(!dir.path().join("poems.csv.dedupe.tmp").exists());
    }
}
