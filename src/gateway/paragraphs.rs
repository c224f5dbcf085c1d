use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{HarvestError, Result};
use crate::gateway::ensure_parent;

/// `{"mod": [paragraph, ...]}`, the shape of baseline and per-band paragraph files.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ParagraphFile {
    #[serde(default, rename = "mod")]
    paragraphs: Vec<String>,
}

/// Read a paragraph file. An absent or empty list is an error.
pub fn read_paragraphs(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    let file: ParagraphFile = serde_json::from_str(&text)?;
    if file.paragraphs.is_empty() {
        return Err(HarvestError::EmptyBaseline(path.to_path_buf()));
    }
    Ok(file.paragraphs)
}

/// Pretty-printed, non-ASCII kept as is.
pub fn write_paragraphs(path: &Path, paragraphs: &[String]) -> Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_string_pretty(&ParagraphFile { paragraphs: paragraphs.to_vec() })?;
    fs::write(path, body)?;
    Ok(())
}
