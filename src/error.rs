use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Every attempt failed; `last_error` holds the final cause.
    Exhausted,
    /// The request can never succeed (bad URL, request could not be built).
    Fatal,
}

#[derive(Error, Debug)]
#[error("fetch of {url} failed after {attempts} attempt(s) ({kind:?}): {last_error}")]
pub struct FetchError {
    pub url: String,
    pub attempts: u32,
    pub kind: FetchErrorKind,
    pub last_error: String,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("could not find poems table on page {page}")]
    TableNotFound { page: u32 },
}

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid page range {start}..={end}: pages start at 1 and end must be >= start")]
    InvalidPageRange { start: u32, end: u32 },

    #[error("no passages found in {}", .0.display())]
    EmptyBaseline(PathBuf),

    #[error("missing key columns in CSV header: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
