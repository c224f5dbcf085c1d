//! Pipeline counters.
//!
//! Calls are no-ops until [`init_metrics`] installs the Prometheus recorder, so library
//! code records unconditionally and tests need no setup.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install an in-process recorder (no HTTP listener). Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
        }
        Err(e) => warn!("Failed to install metrics recorder: {}", e),
    }
}

/// Write the current Prometheus text exposition to `path`.
pub fn write_snapshot(path: &Path) -> std::io::Result<()> {
    let Some(handle) = HANDLE.get() else {
        warn!("Metrics snapshot requested but no recorder is installed");
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, handle.render())?;
    info!("Wrote metrics snapshot to {}", path.display());
    Ok(())
}

pub struct FetchMetrics;

impl FetchMetrics {
    pub fn attempt() {
        ::metrics::counter!("fetch_attempts_total").increment(1);
    }

    pub fn retry(wait_secs: f64) {
        ::metrics::counter!("fetch_retries_total").increment(1);
        ::metrics::histogram!("fetch_backoff_seconds").record(wait_secs);
    }

    pub fn exhausted() {
        ::metrics::counter!("fetch_exhausted_total").increment(1);
    }
}

pub struct CacheMetrics;

impl CacheMetrics {
    pub fn hit() {
        ::metrics::counter!("cache_hits_total").increment(1);
    }

    pub fn miss() {
        ::metrics::counter!("cache_misses_total").increment(1);
    }
}

pub struct HarvestMetrics;

impl HarvestMetrics {
    pub fn page_done(rows: usize) {
        ::metrics::counter!("harvest_pages_total").increment(1);
        ::metrics::counter!("harvest_rows_total").increment(rows as u64);
    }
}

pub struct ShortlistMetrics;

impl ShortlistMetrics {
    pub fn scanned() {
        ::metrics::counter!("shortlist_candidates_scanned_total").increment(1);
    }

    pub fn accepted() {
        ::metrics::counter!("shortlist_candidates_accepted_total").increment(1);
    }
}
