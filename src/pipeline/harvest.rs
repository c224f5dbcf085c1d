use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::app::ports::{DocumentSource, SleepPort};
use crate::config::{secs, HarvestConfig};
use crate::error::{HarvestError, Result};
use crate::gateway::{checkpoint, corpus};
use crate::metrics::HarvestMetrics;
use crate::parser::parse_listing_page;
use crate::types::{format_duration, HarvestRunState};

#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub listing_url_template: String,
    pub start_page: u32,
    pub end_page: u32,
    pub output: PathBuf,
    pub checkpoint: PathBuf,
    pub delay: Duration,
    pub resume: bool,
}

impl HarvestOptions {
    pub fn from_config(cfg: &HarvestConfig) -> Self {
        Self {
            listing_url_template: cfg.listing_url_template.clone(),
            start_page: cfg.start_page,
            end_page: cfg.end_page,
            output: cfg.output.clone(),
            checkpoint: cfg.checkpoint.clone(),
            delay: secs(cfg.delay_secs),
            resume: cfg.resume,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// First page actually fetched after resolving the checkpoint.
    pub first_page: u32,
    pub pages_completed: u32,
    pub rows_written: usize,
}

pub fn listing_url(template: &str, page: u32) -> String {
    template.replace("{page}", &page.to_string())
}

/// Walk the listing pages in order, appending rows and advancing the checkpoint
/// after each page. The first fetch or parse failure ends the run.
pub fn run<D, S>(source: &mut D, sleeper: &S, opts: &HarvestOptions) -> Result<HarvestSummary>
where
    D: DocumentSource,
    S: SleepPort,
{
    if opts.start_page == 0 || opts.end_page < opts.start_page || opts.end_page == u32::MAX {
        return Err(HarvestError::InvalidPageRange { start: opts.start_page, end: opts.end_page });
    }
    corpus::ensure_header(&opts.output)?;

    let start = checkpoint::resolve_start_page(opts.start_page, opts.resume, &opts.checkpoint);
    let mut summary = HarvestSummary { first_page: start, ..Default::default() };
    if start > opts.end_page {
        info!("Checkpoint is past end page {}; nothing to harvest", opts.end_page);
        return Ok(summary);
    }

    let mut state = HarvestRunState::new(start, opts.end_page);
    info!(
        "Harvesting pages {}..={} into {}",
        start,
        opts.end_page,
        opts.output.display()
    );

    for page in start..=opts.end_page {
        let url = listing_url(&opts.listing_url_template, page);

        let rows = fetch_and_parse(source, &url, page).map_err(|e| {
            error!("Stopping at page {}: {}", page, e);
            e
        })?;
        corpus::append_records(&opts.output, &rows)?;
        checkpoint::save(&opts.checkpoint, page + 1)?;

        state.pages_completed += 1;
        summary.pages_completed += 1;
        summary.rows_written += rows.len();
        HarvestMetrics::page_done(rows.len());

        info!(
            "Page {}: wrote {} rows | progress {}/{} | elapsed {} | ETA {}",
            page,
            rows.len(),
            state.pages_completed,
            state.pages_total,
            format_duration(state.elapsed()),
            format_duration(state.eta())
        );

        if page < opts.end_page && !opts.delay.is_zero() {
            sleeper.sleep(opts.delay);
        }
    }

    info!(
        pages = summary.pages_completed,
        rows = summary.rows_written,
        "Harvest finished in {}",
        format_duration(state.elapsed())
    );
    Ok(summary)
}

fn fetch_and_parse<D: DocumentSource>(
    source: &mut D,
    url: &str,
    page: u32,
) -> Result<Vec<crate::types::PoemRecord>> {
    let bytes = source.fetch(url)?;
    let html = String::from_utf8_lossy(&bytes);
    Ok(parse_listing_page(&html, page, url)?)
}
