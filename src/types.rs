use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// One row of a catalog listing page. Appended to the corpus, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemRecord {
    pub title: String,
    pub link: String,
    #[serde(rename = "lines")]
    pub line_count: u32,
    #[serde(rename = "views")]
    pub view_count: u64,
    pub source_page: u32,
}

/// A poem under evaluation for band membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
    pub line_count: u32,
    pub view_count: u64,
    pub typed_chars: u32,
    pub word_count: u32,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandName {
    Easy,
    Medium,
    Hard,
}

impl BandName {
    /// Fixed assignment priority.
    pub const ALL: [BandName; 3] = [BandName::Easy, BandName::Medium, BandName::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            BandName::Easy => "easy",
            BandName::Medium => "medium",
            BandName::Hard => "hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(BandName::Easy),
            "medium" => Some(BandName::Medium),
            "hard" => Some(BandName::Hard),
            _ => None,
        }
    }
}

impl fmt::Display for BandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive integer range over typed characters and words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub name: BandName,
    pub char_range: (u32, u32),
    pub word_range: (u32, u32),
}

impl Band {
    pub fn contains(&self, typed_chars: u32, word_count: u32) -> bool {
        (self.char_range.0..=self.char_range.1).contains(&typed_chars)
            && (self.word_range.0..=self.word_range.1).contains(&word_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub next_page: u32,
}

/// Progress bookkeeping for ETA reporting; never persisted.
#[derive(Debug, Clone)]
pub struct HarvestRunState {
    pub pages_completed: u32,
    pub pages_total: u32,
    pub started: Instant,
}

impl HarvestRunState {
    pub fn new(start_page: u32, end_page: u32) -> Self {
        Self {
            pages_completed: 0,
            pages_total: end_page.saturating_sub(start_page) + 1,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `elapsed / completed * remaining`; zero before the first page completes.
    pub fn eta(&self) -> Duration {
        eta_for(self.elapsed(), self.pages_completed, self.pages_total)
    }
}

pub fn eta_for(elapsed: Duration, completed: u32, total: u32) -> Duration {
    if completed == 0 {
        return Duration::ZERO;
    }
    let remaining = total.saturating_sub(completed);
    elapsed.div_f64(completed as f64).mul_f64(remaining as f64)
}

/// `HH:MM:SS`, hours not wrapped.
pub fn format_duration(d: Duration) -> String {
    let total = d.as_secs();
    let (hours, rem) = (total / 3600, total % 3600);
    format!("{:02}:{:02}:{:02}", hours, rem / 60, rem % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_contains_is_inclusive_on_both_metrics() {
        let band = Band { name: BandName::Medium, char_range: (67, 83), word_range: (10, 20) };
        assert!(band.contains(67, 10));
        assert!(band.contains(83, 20));
        assert!(!band.contains(84, 15));
        assert!(!band.contains(70, 9));
    }

    #[test]
    fn test_eta_scales_average_by_remaining_pages() {
        let eta = eta_for(Duration::from_secs(30), 3, 10);
        assert_eq!(eta, Duration::from_secs(70));
        assert_eq!(eta_for(Duration::from_secs(5), 0, 10), Duration::ZERO);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_duration(Duration::from_secs(3725)), "01:02:05");
        assert_eq!(format_duration(Duration::from_secs(360_000)), "100:00:00");
    }

    #[test]
    fn test_band_name_parse() {
        assert_eq!(BandName::parse(" Hard "), Some(BandName::Hard));
        assert_eq!(BandName::parse("extreme"), None);
        assert_eq!(BandName::Easy.to_string(), "easy");
    }
}
