use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;
use crate::gateway::shortlist_file::{read_shortlist, ShortlistRow};
use crate::types::BandName;

/// Author display name from the second-to-last path segment of a poem link,
/// e.g. `.../percy-bysshe-shelley/ozymandias-1` gives "Percy Bysshe Shelley".
pub fn author_from_link(link: &str) -> String {
    let parts: Vec<&str> = link.trim_matches('/').split('/').collect();
    if parts.len() < 2 {
        return "Unknown Author".to_string();
    }
    parts[parts.len() - 2]
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Forum markup: one heading per band in priority order, one link line per poem.
pub fn format_post(by_band: &BTreeMap<BandName, Vec<ShortlistRow>>) -> String {
    let mut lines = Vec::new();
    for (i, band) in BandName::ALL.iter().enumerate() {
        lines.push(format!("[h2]Poems included - {}[/h2]", band));
        for row in by_band.get(band).map(Vec::as_slice).unwrap_or_default() {
            let link = row.link.trim();
            lines.push(format!(
                "* [url={}]{} by {}[/url]",
                link,
                row.title.trim(),
                author_from_link(link)
            ));
        }
        if i + 1 < BandName::ALL.len() {
            lines.push(String::new());
        }
    }
    let mut post = lines.join("\n");
    post.push('\n');
    post
}

pub fn format_post_from_file(shortlist: &Path) -> Result<String> {
    Ok(format_post(&read_shortlist(shortlist)?))
}
