use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::app::ports::{DocumentSource, SleepPort};
use crate::config::BandsConfig;
use crate::error::Result;
use crate::gateway::paragraphs::write_paragraphs;
use crate::gateway::shortlist_file::ShortlistRow;
use crate::parser::extract_poem_text;
use crate::parser::poem_text::clean_sample_text;
use crate::types::BandName;

const EXTRACT_RETRY_STEP_SECS: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct BandModsOptions {
    pub out_dir: PathBuf,
    pub target_per_band: usize,
    pub extract_attempts: u32,
}

impl BandModsOptions {
    pub fn from_config(cfg: &BandsConfig) -> Self {
        Self {
            out_dir: cfg.out_dir.clone(),
            target_per_band: cfg.target_per_band,
            extract_attempts: cfg.extract_attempts.max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandFileReport {
    pub band: BandName,
    pub path: PathBuf,
    pub written: usize,
    pub fallbacks: usize,
    pub skipped: usize,
}

pub fn band_file_name(band: BandName) -> String {
    format!("mod.paragraphs.{}", band)
}

/// Write one paragraph file per band from the shortlist, fetching each poem's page
/// again for its full text. The shortlist sample stands in when extraction keeps failing.
pub fn build_band_files<D, S>(
    by_band: &BTreeMap<BandName, Vec<ShortlistRow>>,
    source: &mut D,
    sleeper: &S,
    opts: &BandModsOptions,
) -> Result<Vec<BandFileReport>>
where
    D: DocumentSource,
    S: SleepPort,
{
    let mut reports = Vec::with_capacity(BandName::ALL.len());

    for band in BandName::ALL {
        let mut paragraphs = Vec::new();
        let mut report = BandFileReport {
            band,
            path: opts.out_dir.join(band_file_name(band)),
            written: 0,
            fallbacks: 0,
            skipped: 0,
        };

        for row in by_band.get(&band).map(Vec::as_slice).unwrap_or_default() {
            if paragraphs.len() >= opts.target_per_band {
                break;
            }
            let title = row.title.trim();
            let link = row.link.trim();
            if link.is_empty() {
                continue;
            }

            let text = extract_with_retries(source, sleeper, link, title, opts.extract_attempts);
            if !text.is_empty() {
                paragraphs.push(text);
                continue;
            }
            let fallback = clean_sample_text(&row.sample_text);
            if fallback.is_empty() {
                warn!("{}: skipped {} ({})", band, title, link);
                report.skipped += 1;
            } else {
                info!("{}: fallback sample_text for {} ({})", band, title, link);
                report.fallbacks += 1;
                paragraphs.push(fallback);
            }
        }

        write_paragraphs(&report.path, &paragraphs)?;
        report.written = paragraphs.len();
        info!("{}: wrote {} paragraphs -> {}", band, report.written, report.path.display());
        reports.push(report);
    }

    Ok(reports)
}

fn extract_with_retries<D: DocumentSource, S: SleepPort>(
    source: &mut D,
    sleeper: &S,
    link: &str,
    title: &str,
    attempts: u32,
) -> String {
    for attempt in 1..=attempts {
        match source.fetch(link) {
            Ok(bytes) => {
                let text = extract_poem_text(&String::from_utf8_lossy(&bytes), title);
                if !text.is_empty() {
                    return text;
                }
            }
            Err(e) => warn!("Fetch failed for {} (attempt {}/{}): {}", link, attempt, attempts, e),
        }
        if attempt < attempts {
            sleeper.sleep(Duration::from_secs_f64(EXTRACT_RETRY_STEP_SECS * attempt as f64));
        }
    }
    String::new()
}
