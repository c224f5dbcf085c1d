use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::gateway::{ensure_parent, write_atomic};
use crate::types::CheckpointState;

/// The persisted next page, if the file holds an integer `next_page` >= 1.
/// Anything unreadable counts as "no checkpoint".
pub fn load(path: &Path) -> Option<u32> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Could not read checkpoint {}: {}", path.display(), e);
            return None;
        }
    };
    let value: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Could not read checkpoint {}: {}", path.display(), e);
            return None;
        }
    };
    value
        .get("next_page")
        .and_then(|v| v.as_u64())
        .filter(|&n| n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

pub fn save(path: &Path, next_page: u32) -> std::io::Result<()> {
    ensure_parent(path)?;
    let body = serde_json::to_vec_pretty(&CheckpointState { next_page })
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    write_atomic(path, &body)
}

/// `max(start_page, checkpoint)` when resuming, otherwise `start_page`.
pub fn resolve_start_page(start_page: u32, resume: bool, path: &Path) -> u32 {
    if !resume {
        return start_page;
    }
    match load(path) {
        Some(saved) => {
            let start = start_page.max(saved);
            info!("Resuming from checkpoint page {}", start);
            start
        }
        None => start_page,
    }
}
