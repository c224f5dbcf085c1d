use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{HarvestError, Result};
use crate::gateway::paragraphs::read_paragraphs;
use crate::parser::text::normalize_for_difficulty;
use crate::types::BandName;

pub const METRICS_FILE: &str = "paragraph_metrics.csv";
pub const SUMMARY_FILE: &str = "dataset_summary.json";

#[derive(Debug, Clone, PartialEq)]
pub struct ParagraphMetrics {
    pub dataset: String,
    /// 1-based position in the dataset file.
    pub index: usize,
    pub raw_chars: usize,
    pub typed_chars: usize,
    pub words: usize,
    pub unique_words: usize,
    pub avg_word_len: f64,
    pub punctuation_removed: usize,
    pub punctuation_ratio: f64,
}

pub fn paragraph_metrics(dataset: &str, index: usize, text: &str) -> ParagraphMetrics {
    let raw_chars = text.chars().count();
    let typed = normalize_for_difficulty(text);
    let typed_chars = typed.chars().count();
    let words: Vec<&str> = typed.split(' ').filter(|w| !w.is_empty()).collect();
    let unique: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
    let avg_word_len = if words.is_empty() {
        0.0
    } else {
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64
    };
    let punctuation_removed = raw_chars.saturating_sub(typed_chars);
    let punctuation_ratio = if raw_chars == 0 { 0.0 } else { punctuation_removed as f64 / raw_chars as f64 };

    ParagraphMetrics {
        dataset: dataset.to_string(),
        index,
        raw_chars,
        typed_chars,
        words: words.len(),
        unique_words: unique.len(),
        avg_word_len,
        punctuation_removed,
        punctuation_ratio,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub count: usize,
    pub typed_chars_mean: f64,
    pub typed_chars_median: f64,
    pub typed_chars_min: usize,
    pub typed_chars_max: usize,
    pub words_mean: f64,
    pub words_median: f64,
    pub words_min: usize,
    pub words_max: usize,
    pub unique_words_mean: f64,
    pub punctuation_ratio_mean: f64,
}

impl DatasetSummary {
    pub fn from_rows(rows: &[ParagraphMetrics]) -> Self {
        let typed: Vec<f64> = rows.iter().map(|r| r.typed_chars as f64).collect();
        let words: Vec<f64> = rows.iter().map(|r| r.words as f64).collect();
        let unique: Vec<f64> = rows.iter().map(|r| r.unique_words as f64).collect();
        let punct: Vec<f64> = rows.iter().map(|r| r.punctuation_ratio).collect();
        Self {
            count: rows.len(),
            typed_chars_mean: round_to(mean(&typed), 2),
            typed_chars_median: round_to(median(&typed), 2),
            typed_chars_min: rows.iter().map(|r| r.typed_chars).min().unwrap_or(0),
            typed_chars_max: rows.iter().map(|r| r.typed_chars).max().unwrap_or(0),
            words_mean: round_to(mean(&words), 2),
            words_median: round_to(median(&words), 2),
            words_min: rows.iter().map(|r| r.words).min().unwrap_or(0),
            words_max: rows.iter().map(|r| r.words).max().unwrap_or(0),
            unique_words_mean: round_to(mean(&unique), 2),
            punctuation_ratio_mean: round_to(mean(&punct), 4),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Dataset name to summary, serialised in the order the datasets were given.
struct Summaries<'a>(&'a [(String, DatasetSummary)]);

impl Serialize for Summaries<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(name, summary)| (name, summary)))
    }
}

#[derive(Serialize)]
struct MetricsCsvRow<'a> {
    dataset: &'a str,
    index: usize,
    raw_chars: usize,
    typed_chars: usize,
    words: usize,
    unique_words: usize,
    avg_word_len: String,
    punctuation_removed: usize,
    punctuation_ratio: String,
}

impl<'a> From<&'a ParagraphMetrics> for MetricsCsvRow<'a> {
    fn from(m: &'a ParagraphMetrics) -> Self {
        Self {
            dataset: &m.dataset,
            index: m.index,
            raw_chars: m.raw_chars,
            typed_chars: m.typed_chars,
            words: m.words,
            unique_words: m.unique_words,
            avg_word_len: format!("{:.4}", m.avg_word_len),
            punctuation_removed: m.punctuation_removed,
            punctuation_ratio: format!("{:.6}", m.punctuation_ratio),
        }
    }
}

/// `NAME=PATH`, both sides non-empty after trimming.
pub fn parse_dataset_spec(spec: &str) -> Result<(String, PathBuf)> {
    let invalid = || HarvestError::Config(format!("invalid dataset '{}', expected NAME=PATH", spec));
    let (name, path) = spec.split_once('=').ok_or_else(invalid)?;
    let (name, path) = (name.trim(), path.trim());
    if name.is_empty() || path.is_empty() {
        return Err(invalid());
    }
    Ok((name.to_string(), PathBuf::from(path)))
}

/// The baseline set followed by the three band files.
pub fn default_datasets(baseline: &Path, band_dir: &Path) -> Vec<(String, PathBuf)> {
    let mut datasets = vec![("vanilla".to_string(), baseline.to_path_buf())];
    datasets.extend(
        BandName::ALL
            .iter()
            .map(|b| (b.to_string(), band_dir.join(format!("mod.paragraphs.{}", b)))),
    );
    datasets
}

#[derive(Debug)]
pub struct CompareReport {
    pub summaries: Vec<(String, DatasetSummary)>,
    pub metrics_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Score every paragraph of every dataset and write the per-paragraph CSV and the summary JSON.
pub fn compare_datasets(datasets: &[(String, PathBuf)], out_dir: &Path) -> Result<CompareReport> {
    let mut all_rows = Vec::new();
    let mut summaries = Vec::with_capacity(datasets.len());

    for (name, path) in datasets {
        let paragraphs = read_paragraphs(path)?;
        let rows: Vec<ParagraphMetrics> = paragraphs
            .iter()
            .enumerate()
            .map(|(i, text)| paragraph_metrics(name, i + 1, text))
            .collect();
        info!("{}: {} paragraphs from {}", name, rows.len(), path.display());
        summaries.push((name.clone(), DatasetSummary::from_rows(&rows)));
        all_rows.extend(rows);
    }

    fs::create_dir_all(out_dir)?;
    let metrics_path = out_dir.join(METRICS_FILE);
    let mut writer = csv::Writer::from_path(&metrics_path)?;
    for row in &all_rows {
        writer.serialize(MetricsCsvRow::from(row))?;
    }
    writer.flush()?;

    let summary_path = out_dir.join(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&Summaries(&summaries))?)?;

    Ok(CompareReport { summaries, metrics_path, summary_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::paragraphs::write_paragraphs;

    #[test]
    fn test_paragraph_metrics() {
        let m = paragraph_metrics("easy", 1, "The cat, the Cat!");
        assert_eq!(m.raw_chars, 17);
        assert_eq!(m.typed_chars, 15);
        assert_eq!(m.words, 4);
        assert_eq!(m.unique_words, 2);
        assert_eq!(m.avg_word_len, 3.0);
        assert_eq!(m.punctuation_removed, 2);
        assert!((m.punctuation_ratio - 2.0 / 17.0).abs() < 1e-12);
    }

    #[test]
    fn test_dataset_spec_parsing() {
        assert_eq!(
            parse_dataset_spec(" hard = band_mods/mod.paragraphs.hard ").unwrap(),
            ("hard".to_string(), PathBuf::from("band_mods/mod.paragraphs.hard"))
        );
        assert!(parse_dataset_spec("hard").is_err());
        assert!(parse_dataset_spec("=path").is_err());
    }

    #[test]
    fn test_summary_statistics() {
        let rows: Vec<ParagraphMetrics> = ["one two", "one two three", "a b c d e f"]
            .iter()
            .enumerate()
            .map(|(i, t)| paragraph_metrics("x", i + 1, t))
            .collect();
        let s = DatasetSummary::from_rows(&rows);
        assert_eq!(s.count, 3);
        assert_eq!(s.words_median, 3.0);
        assert_eq!(s.words_mean, 3.67);
        assert_eq!(s.typed_chars_min, 7);
        assert_eq!(s.typed_chars_max, 13);
    }

    #[test]
    fn test_outputs_keep_dataset_order() {
        let dir = tempfile::tempdir().unwrap();
        let vanilla = dir.path().join("mod.paragraphs");
        write_paragraphs(&vanilla, &["Zebra crossing.".to_string(), "Apples!".to_string()]).unwrap();
        let band_dir = dir.path().join("band_mods");
        for band in BandName::ALL {
            write_paragraphs(&band_dir.join(format!("mod.paragraphs.{}", band)), &[format!("{} text", band)]).unwrap();
        }

        let out = dir.path().join("analysis");
        let report = compare_datasets(&default_datasets(&vanilla, &band_dir), &out).unwrap();
        let names: Vec<&str> = report.summaries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["vanilla", "easy", "medium", "hard"]);

        let json = fs::read_to_string(&report.summary_path).unwrap();
        let positions: Vec<usize> = ["\"vanilla\"", "\"easy\"", "\"medium\"", "\"hard\""]
            .iter()
            .map(|k| json.find(k).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let csv_text = fs::read_to_string(&report.metrics_path).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "dataset,index,raw_chars,typed_chars,words,unique_words,avg_word_len,punctuation_removed,punctuation_ratio"
        );
        assert_eq!(lines.next().unwrap(), "vanilla,1,15,14,2,2,6.5000,1,0.066667");
        assert_eq!(csv_text.lines().count(), 6);
    }
}
