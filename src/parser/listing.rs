use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::debug;

use crate::constants::LISTING_HEADERS;
use crate::error::ParseError;
use crate::parser::{joined_text, owned_by};
use crate::types::PoemRecord;

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("valid selector"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td, th").expect("valid selector"));
static DATA_CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("valid selector"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Parse one catalog listing page into poem rows, in page order.
///
/// The poems table is the first table whose own first row carries at least the
/// "poem title", "author", "lines" and "views" header cells. Rows of nested tables
/// belong to the nested table, not to the one wrapping it.
pub fn parse_listing_page(html: &str, page: u32, base_url: &str) -> Result<Vec<PoemRecord>, ParseError> {
    let document = Html::parse_document(html);
    let table = document
        .select(&TABLE)
        .find(is_poems_table)
        .ok_or(ParseError::TableNotFound { page })?;

    let base = Url::parse(base_url).ok();
    let mut records = Vec::new();

    for row in own_rows(&table).into_iter().skip(1) {
        let cells = own_cells(&row, &DATA_CELL);
        if cells.len() < 4 {
            continue;
        }
        let title = joined_text(&cells[0], " ");
        if title.is_empty() {
            continue;
        }
        let link = cells[0]
            .select(&ANCHOR)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| resolve_link(base.as_ref(), href))
            .unwrap_or_default();

        records.push(PoemRecord {
            title,
            link,
            line_count: parse_count(&joined_text(&cells[2], " ")),
            view_count: parse_count(&joined_text(&cells[3], " ")),
            source_page: page,
        });
    }

    debug!(page, rows = records.len(), "parsed listing page");
    Ok(records)
}

fn is_poems_table(table: &ElementRef) -> bool {
    let Some(first) = own_rows(table).into_iter().next() else {
        return false;
    };
    let headers: HashSet<String> = own_cells(&first, &HEADER_CELL)
        .iter()
        .map(|c| joined_text(c, " ").to_lowercase())
        .collect();
    LISTING_HEADERS.iter().all(|h| headers.contains(*h))
}

fn own_rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    table.select(&ROW).filter(|tr| owned_by(tr, table, "table")).collect()
}

fn own_cells<'a>(row: &ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    row.select(selector).filter(|td| owned_by(td, row, "tr")).collect()
}

fn resolve_link(base: Option<&Url>, href: &str) -> String {
    base.and_then(|b| b.join(href.trim()).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| href.trim().to_string())
}

/// Digits only, thousands separators tolerated; anything else is 0.
fn parse_count<T: std::str::FromStr + Default>(raw: &str) -> T {
    let digits: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return T::default();
    }
    digits.parse().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.public-domain-poetry.com/listpoetry.php?letter=All&page=3";

    fn listing(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table><tr><td>Main Menu</td><td>Authors</td></tr></table>
            <table class="list">
              <tr><th>Poem Title</th><th>Author</th><th> Lines </th><th>VIEWS</th></tr>
              {}
            </table>
            </body></html>"#,
            rows
        )
    }

    #[test]
    fn test_rows_parsed_in_order_with_absolute_links() {
        let html = listing(
            r#"<tr><td><a href="/percy-bysshe-shelley/ozymandias-1">Ozymandias</a></td><td>Shelley</td><td>14</td><td>1,204</td></tr>
               <tr><td><a href="william-blake/the-tyger-2">The  Tyger</a></td><td>Blake</td><td>24</td><td>88</td></tr>"#,
        );
        let rows = parse_listing_page(&html, 3, BASE).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Ozymandias");
        assert_eq!(rows[0].link, "https://www.public-domain-poetry.com/percy-bysshe-shelley/ozymandias-1");
        assert_eq!(rows[0].line_count, 14);
        assert_eq!(rows[0].view_count, 1204);
        assert_eq!(rows[0].source_page, 3);
        // inner whitespace is kept as listed
        assert_eq!(rows[1].title, "The  Tyger");
        assert_eq!(rows[1].link, "https://www.public-domain-poetry.com/william-blake/the-tyger-2");
    }

    #[test]
    fn test_short_rows_blank_titles_and_missing_anchors() {
        let html = listing(
            r#"<tr><td colspan="4">Sponsored</td></tr>
               <tr><td> </td><td>Nobody</td><td>3</td><td>4</td></tr>
               <tr><td>Untitled Fragment</td><td>Anon</td><td>n/a</td><td>-</td></tr>"#,
        );
        let rows = parse_listing_page(&html, 1, BASE).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Untitled Fragment");
        assert_eq!(rows[0].link, "");
        assert_eq!(rows[0].line_count, 0);
        assert_eq!(rows[0].view_count, 0);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let html = "<html><body><table><tr><td>Title</td><td>Views</td></tr></table></body></html>";
        assert_eq!(
            parse_listing_page(html, 9, BASE),
            Err(ParseError::TableNotFound { page: 9 })
        );
    }

    #[test]
    fn test_layout_table_wrapping_the_listing_is_skipped() {
        let html = format!(
            r#"<table><tr><td>{}</td></tr></table>"#,
            listing(r#"<tr><td><a href="/a/b">Inner</a></td><td>A</td><td>10</td><td>5</td></tr>"#)
        );
        let rows = parse_listing_page(&html, 2, BASE).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "Inner");
    }
}
