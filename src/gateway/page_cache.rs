use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::app::ports::DocumentSource;
use crate::error::{FetchError, FetchErrorKind};
use crate::gateway::write_atomic;
use crate::metrics::CacheMetrics;

/// Hex SHA-256 of the URL string; the on-disk name of its cache entry.
pub fn cache_key(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// URL -> raw document store in front of a fetcher. Entries never expire.
pub struct PageCache<F> {
    root: PathBuf,
    source: F,
}

impl<F: DocumentSource> PageCache<F> {
    pub fn new(root: impl Into<PathBuf>, source: F) -> Self {
        Self { root: root.into(), source }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.root.join(format!("{}.html", cache_key(url)))
    }

    pub fn get_or_fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.path_for(url);
        match fs::read(&path) {
            Ok(bytes) => {
                CacheMetrics::hit();
                debug!(url, path = %path.display(), "cache hit");
                return Ok(bytes);
            }
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                warn!("Unreadable cache entry {} ({}); refetching", path.display(), e);
            }
            Err(_) => {}
        }

        CacheMetrics::miss();
        let bytes = self.source.fetch(url)?;
        fs::create_dir_all(&self.root).map_err(|e| store_error(url, e))?;
        write_atomic(&path, &bytes).map_err(|e| store_error(url, e))?;
        debug!(url, path = %path.display(), bytes = bytes.len(), "cached");
        Ok(bytes)
    }
}

impl<F: DocumentSource> DocumentSource for PageCache<F> {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.get_or_fetch(url)
    }
}

fn store_error(url: &str, e: std::io::Error) -> FetchError {
    FetchError {
        url: url.to_string(),
        attempts: 1,
        kind: FetchErrorKind::Fatal,
        last_error: format!("could not store cache entry: {}", e),
    }
}
