use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

use crate::constants::{BOILERPLATE_MARKERS, FALLBACK_MIN_CHARS, MIN_BLOCK_LINES, PRIMARY_MIN_CHARS};
use crate::parser::joined_text;
use crate::parser::text::collapse_whitespace;

static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static BYLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^By\s+").expect("valid regex"));
static EXTRA_INFO: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\s*Extra\s+Info:.*$").expect("valid regex"));
static PRINTABLE_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*Printable\s+Page\s+This\s+page\s+viewed\s+\d+\s+times\.?$").expect("valid regex")
});

/// A table cell's text, as lines, plus the length of the text it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub raw_chars: usize,
    pub has_marker: bool,
    pub lines: Vec<String>,
}

impl Block {
    pub fn from_raw(raw: &str) -> Self {
        Self {
            raw_chars: raw.chars().count(),
            has_marker: BOILERPLATE_MARKERS.iter().any(|m| raw.contains(m)),
            lines: raw
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn qualifies(&self, min_chars: usize) -> bool {
        self.raw_chars >= min_chars && !self.has_marker && self.lines.len() >= MIN_BLOCK_LINES
    }

    fn weight(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum()
    }
}

/// Isolate and clean the poem body of a detail page. Empty when no cell looks like one.
pub fn extract_poem_text(html: &str, title: &str) -> String {
    let document = Html::parse_document(html);
    let blocks: Vec<Block> = document
        .select(&CELL)
        .map(|td| Block::from_raw(&joined_text(&td, "\n")))
        .collect();

    match select_best_block(&blocks) {
        Some(block) => clean_block(&block.lines, title),
        None => {
            debug!(title, cells = blocks.len(), "no table cell qualified as poem text");
            String::new()
        }
    }
}

/// Primary pass at the strict length bar, fallback pass at the lower one.
/// The heaviest qualifying block wins; the first one found wins ties.
pub fn select_best_block(blocks: &[Block]) -> Option<&Block> {
    [PRIMARY_MIN_CHARS, FALLBACK_MIN_CHARS].into_iter().find_map(|min_chars| {
        blocks
            .iter()
            .filter(|b| b.qualifies(min_chars))
            .fold(None, |best: Option<&Block>, b| match best {
                Some(current) if current.weight() >= b.weight() => Some(current),
                _ => Some(b),
            })
    })
}

/// Drop the title line, the byline and boilerplate lines. Each of the first two goes once.
pub fn clean_lines(lines: &[String], title: &str) -> Vec<String> {
    let normalized_title = collapse_whitespace(title).to_lowercase();
    let mut dropped_title = false;
    let mut dropped_byline = false;
    let mut cleaned = Vec::with_capacity(lines.len());

    for line in lines {
        let text = collapse_whitespace(line);
        if text.is_empty() {
            continue;
        }
        if !dropped_title && text.to_lowercase() == normalized_title {
            dropped_title = true;
            continue;
        }
        if !dropped_byline && BYLINE.is_match(&text) {
            dropped_byline = true;
            continue;
        }
        if text.contains("Sponsored Links") || text.starts_with("Public Domain Poetry") {
            continue;
        }
        cleaned.push(text);
    }
    cleaned
}

pub fn clean_block(lines: &[String], title: &str) -> String {
    let joined = clean_lines(lines, title).join(" ");
    let text = EXTRA_INFO.replace(&joined, "");
    let text = PRINTABLE_PAGE.replace(&text, "");
    let text = strip_title_byline(&text, title);
    collapse_whitespace(&text)
}

/// Remove a leading "<title> By <Name> <Name> (dates)" header. Name tokens must be capitalised.
fn strip_title_byline(text: &str, title: &str) -> String {
    let title = collapse_whitespace(title);
    if title.is_empty() {
        return text.to_string();
    }
    let pattern = format!(
        r"^\s*(?i:{})\s+(?i:by)\s+[A-Z][\w'.\-]*(?:\s+[A-Z][\w'.\-]*(?:\s*\([^)]+\))?)*\s+",
        regex::escape(&title)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.replace(text, "").into_owned(),
        Err(e) => {
            debug!("title pattern rejected for {:?}: {}", title, e);
            text.to_string()
        }
    }
}

/// Shortlist sample text reused as a poem body: no "Extra Info" tail, single spaces.
pub fn clean_sample_text(text: &str) -> String {
    collapse_whitespace(&EXTRA_INFO.replace(text, ""))
}
