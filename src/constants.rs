/// Catalog listing page; `{page}` is replaced with the 1-based page number.
pub const LISTING_URL_TEMPLATE: &str =
    "https://www.public-domain-poetry.com/listpoetry.php?letter=All&page={page}";
pub const DEFAULT_END_PAGE: u32 = 771;

pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; PoetryScraper/1.0; +https://example.com)";
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

// Fetch engine
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];
pub const MAX_BACKOFF_SECS: f64 = 60.0;

// File schemas
pub const CORPUS_COLUMNS: [&str; 5] = ["title", "link", "lines", "views", "source_page"];
pub const SHORTLIST_COLUMNS: [&str; 8] = [
    "band",
    "title",
    "link",
    "lines",
    "views",
    "typed_chars",
    "words",
    "sample_text",
];
pub const SAMPLE_TEXT_CHARS: usize = 300;

// Listing table header cells (lower-cased)
pub const LISTING_HEADERS: [&str; 4] = ["poem title", "author", "lines", "views"];

// Poem text extraction
pub const PRIMARY_MIN_CHARS: usize = 250;
pub const FALLBACK_MIN_CHARS: usize = 180;
pub const MIN_BLOCK_LINES: usize = 6;
pub const BOILERPLATE_MARKERS: [&str; 2] = ["Main Menu", "Sponsored Links"];

// Classification
pub const POOL_MIN_LINES: u32 = 8;
pub const POOL_MAX_LINES: u32 = 60;
pub const HARD_CHAR_SLACK: u32 = 80;
pub const HARD_WORD_SLACK: u32 = 20;
