use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::constants::SAMPLE_TEXT_CHARS;
use crate::error::Result;
use crate::gateway::ensure_parent;
use crate::types::{BandName, Candidate};

/// One line of the shortlist file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortlistRow {
    pub band: String,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub lines: String,
    #[serde(default)]
    pub views: String,
    #[serde(default)]
    pub typed_chars: String,
    #[serde(default)]
    pub words: String,
    #[serde(default)]
    pub sample_text: String,
}

impl ShortlistRow {
    pub fn from_candidate(band: BandName, candidate: &Candidate) -> Self {
        Self {
            band: band.as_str().to_string(),
            title: candidate.title.clone(),
            link: candidate.link.clone(),
            lines: candidate.line_count.to_string(),
            views: candidate.view_count.to_string(),
            typed_chars: candidate.typed_chars.to_string(),
            words: candidate.word_count.to_string(),
            sample_text: truncate_chars(&candidate.text, SAMPLE_TEXT_CHARS).to_string(),
        }
    }
}

pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Write the shortlist grouped by band in easy, medium, hard order.
pub fn write_shortlist(path: &Path, selected: &BTreeMap<BandName, Vec<Candidate>>) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    let mut wrote_any = false;
    for band in BandName::ALL {
        for candidate in selected.get(&band).map(Vec::as_slice).unwrap_or_default() {
            writer.serialize(ShortlistRow::from_candidate(band, candidate))?;
            wrote_any = true;
        }
    }
    if !wrote_any {
        writer.write_record(crate::constants::SHORTLIST_COLUMNS)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a shortlist back, grouped by band. Rows with an unknown band are ignored.
pub fn read_shortlist(path: &Path) -> Result<BTreeMap<BandName, Vec<ShortlistRow>>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut by_band: BTreeMap<BandName, Vec<ShortlistRow>> =
        BandName::ALL.iter().map(|b| (*b, Vec::new())).collect();
    for row in reader.deserialize::<ShortlistRow>() {
        let row = row?;
        if let Some(band) = BandName::parse(&row.band) {
            if let Some(rows) = by_band.get_mut(&band) {
                rows.push(row);
            }
        }
    }
    Ok(by_band)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, text: &str) -> Candidate {
        Candidate {
            title: title.into(),
            link: format!("https://x/{}", title),
            line_count: 12,
            view_count: 40,
            typed_chars: 100,
            word_count: 20,
            text: text.into(),
        }
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 300), "short");
    }

    #[test]
    fn test_written_rows_are_grouped_in_priority_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shortlist.csv");
        let mut selected = BTreeMap::new();
        selected.insert(BandName::Hard, vec![candidate("h1", "hard text")]);
        selected.insert(BandName::Easy, vec![candidate("e1", "easy"), candidate("e2", &"x".repeat(400))]);

        write_shortlist(&path, &selected).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("band,title,link,lines,views,typed_chars,words,sample_text"));

        let back = read_shortlist(&path).unwrap();
        let easy: Vec<&str> = back[&BandName::Easy].iter().map(|r| r.title.as_str()).collect();
        assert_eq!(easy, vec!["e1", "e2"]);
        assert_eq!(back[&BandName::Easy][1].sample_text.len(), 300);
        assert!(back[&BandName::Medium].is_empty());
        assert_eq!(back[&BandName::Hard][0].band, "hard");
    }

    #[test]
    fn test_empty_shortlist_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_shortlist(&path, &BTreeMap::new()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), "band,title,link,lines,views,typed_chars,words,sample_text");
    }
}
