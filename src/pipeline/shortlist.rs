use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::app::ports::{DocumentSource, SleepPort};
use crate::config::{secs, ShortlistConfig};
use crate::constants::{POOL_MAX_LINES, POOL_MIN_LINES};
use crate::metrics::ShortlistMetrics;
use crate::parser::{extract_poem_text, score_text};
use crate::types::{Band, BandName, Candidate, PoemRecord};

#[derive(Debug, Clone, Copy)]
pub struct ShortlistOptions {
    pub per_band: usize,
    pub max_fetch: usize,
    /// Pause after every candidate that produced text.
    pub delay: Duration,
}

impl ShortlistOptions {
    pub fn from_config(cfg: &ShortlistConfig) -> Self {
        Self { per_band: cfg.per_band, max_fetch: cfg.max_fetch, delay: secs(cfg.delay_secs) }
    }
}

#[derive(Debug, Clone)]
pub struct ShortlistOutcome {
    pub bands: Vec<Band>,
    pub selected: BTreeMap<BandName, Vec<Candidate>>,
    pub attempted: usize,
}

impl ShortlistOutcome {
    pub fn count(&self, band: BandName) -> usize {
        self.selected.get(&band).map_or(0, Vec::len)
    }
}

/// Poems with a line count in range, most viewed first, then longest first.
pub fn candidate_pool(records: &[PoemRecord]) -> Vec<PoemRecord> {
    let mut pool: Vec<PoemRecord> = records
        .iter()
        .filter(|r| (POOL_MIN_LINES..=POOL_MAX_LINES).contains(&r.line_count))
        .cloned()
        .collect();
    pool.sort_by(|a, b| {
        b.view_count
            .cmp(&a.view_count)
            .then(b.line_count.cmp(&a.line_count))
    });
    pool
}

/// Scan `pool` in order and put each poem into the first open band that admits it.
///
/// Stops when every band holds `per_band` poems or `max_fetch` poems have been tried.
/// Fetch failures and pages without extractable text skip the poem.
pub fn classify<D, S>(
    bands: &[Band],
    pool: &[PoemRecord],
    source: &mut D,
    sleeper: &S,
    opts: &ShortlistOptions,
) -> ShortlistOutcome
where
    D: DocumentSource,
    S: SleepPort,
{
    let mut selected: BTreeMap<BandName, Vec<Candidate>> =
        bands.iter().map(|b| (b.name, Vec::new())).collect();
    let mut attempted = 0usize;

    for record in pool {
        if selected.values().all(|c| c.len() >= opts.per_band) {
            info!("All bands full after {} attempts", attempted);
            break;
        }
        if attempted >= opts.max_fetch {
            info!("Reached fetch limit of {}", opts.max_fetch);
            break;
        }
        attempted += 1;
        ShortlistMetrics::scanned();

        let html = match source.fetch(&record.link) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                warn!("Skipping {:?}: {}", record.title, e);
                continue;
            }
        };
        let text = extract_poem_text(&html, &record.title);
        if text.is_empty() {
            debug!(link = %record.link, "skipping {:?}: no poem text found", record.title);
            continue;
        }

        let metrics = score_text(&text);
        let candidate = Candidate {
            title: record.title.clone(),
            link: record.link.clone(),
            line_count: record.line_count,
            view_count: record.view_count,
            typed_chars: metrics.typed_chars,
            word_count: metrics.words,
            text,
        };

        let open_band = bands.iter().find(|band| {
            selected.get(&band.name).map_or(false, |c| c.len() < opts.per_band)
                && band.contains(candidate.typed_chars, candidate.word_count)
        });
        match open_band {
            Some(band) => {
                debug!(
                    band = %band.name,
                    chars = candidate.typed_chars,
                    words = candidate.word_count,
                    "accepted {:?}",
                    candidate.title
                );
                ShortlistMetrics::accepted();
                selected.entry(band.name).or_default().push(candidate);
            }
            None => debug!(
                chars = candidate.typed_chars,
                words = candidate.word_count,
                "no open band for {:?}",
                candidate.title
            ),
        }

        if !opts.delay.is_zero() {
            sleeper.sleep(opts.delay);
        }
    }

    ShortlistOutcome { bands: bands.to_vec(), selected, attempted }
}
