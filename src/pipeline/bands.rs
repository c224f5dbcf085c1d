use std::path::Path;
use tracing::info;

use crate::constants::{HARD_CHAR_SLACK, HARD_WORD_SLACK};
use crate::error::{HarvestError, Result};
use crate::gateway::paragraphs::read_paragraphs;
use crate::parser::score_text;
use crate::types::{Band, BandName};

/// Tertile cut points with inclusive linear interpolation over sorted `values`.
pub fn tertiles_inclusive(values: &[u32]) -> (f64, f64) {
    let mut sorted: Vec<f64> = values.iter().map(|&v| v as f64).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    (quantile_inclusive(&sorted, 1, 3), quantile_inclusive(&sorted, 2, 3))
}

/// The `i`th of `n` cut points; `sorted` must be non-empty.
fn quantile_inclusive(sorted: &[f64], i: usize, n: usize) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let m = sorted.len() - 1;
    let j = i * m / n;
    let delta = (i * m - j * n) as f64;
    (sorted[j] * (n as f64 - delta) + sorted[j + 1] * delta) / n as f64
}

/// Integer bands over one metric: `[min, q1]`, `[q1+1, q2]`, `[q2+1, max+slack]`.
fn metric_ranges(values: &[u32], slack: u32) -> [(u32, u32); 3] {
    let (q1, q2) = tertiles_inclusive(values);
    let (q1, q2) = (q1 as u32, q2 as u32);
    let min = values.iter().copied().min().unwrap_or(0);
    let max = values.iter().copied().max().unwrap_or(0);
    [(min, q1), (q1 + 1, q2), (q2 + 1, max.saturating_add(slack))]
}

/// Bands in priority order, from the typing metrics of the baseline passages.
pub fn compute_bands(baseline: &[String]) -> Option<Vec<Band>> {
    if baseline.is_empty() {
        return None;
    }
    let metrics: Vec<_> = baseline.iter().map(|t| score_text(t)).collect();
    let chars: Vec<u32> = metrics.iter().map(|m| m.typed_chars).collect();
    let words: Vec<u32> = metrics.iter().map(|m| m.words).collect();

    let char_ranges = metric_ranges(&chars, HARD_CHAR_SLACK);
    let word_ranges = metric_ranges(&words, HARD_WORD_SLACK);

    Some(
        BandName::ALL
            .iter()
            .enumerate()
            .map(|(i, &name)| Band { name, char_range: char_ranges[i], word_range: word_ranges[i] })
            .collect(),
    )
}

pub fn load_bands(baseline_path: &Path) -> Result<Vec<Band>> {
    let baseline = read_paragraphs(baseline_path)?;
    let bands = compute_bands(&baseline)
        .ok_or_else(|| HarvestError::EmptyBaseline(baseline_path.to_path_buf()))?;
    for band in &bands {
        info!(
            "Band {}: chars {:?}, words {:?} from {} baseline passages",
            band.name,
            band.char_range,
            band.word_range,
            baseline.len()
        );
    }
    Ok(bands)
}
