//! HTML parsers for the catalog: listing pages and poem detail pages.

pub mod listing;
pub mod poem_text;
pub mod text;

pub use listing::parse_listing_page;
pub use poem_text::extract_poem_text;
pub use text::{score_text, TextMetrics};

use scraper::ElementRef;

/// Text of an element with each text node trimmed, empty nodes dropped, joined by `sep`.
pub(crate) fn joined_text(el: &ElementRef, sep: &str) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

/// True when the closest `tag` ancestor of `el` is `owner`.
pub(crate) fn owned_by(el: &ElementRef, owner: &ElementRef, tag: &str) -> bool {
    el.ancestors()
        .find(|n| n.value().as_element().map(|e| e.name() == tag).unwrap_or(false))
        .map(|n| n.id() == owner.id())
        .unwrap_or(false)
}
