use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{ACCEPT_HTML, DEFAULT_END_PAGE, LISTING_URL_TEMPLATE, USER_AGENT};
use crate::error::{HarvestError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "poem_harvester.toml";

/// Upper bound for any configured delay or timeout.
pub const MAX_CONFIG_SECS: f64 = 86_400.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub harvest: HarvestConfig,
    pub shortlist: ShortlistConfig,
    pub bands: BandsConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { user_agent: USER_AGENT.to_string(), accept: ACCEPT_HTML.to_string() }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub listing_url_template: String,
    pub start_page: u32,
    pub end_page: u32,
    pub output: PathBuf,
    pub checkpoint: PathBuf,
    pub delay_secs: f64,
    pub timeout_secs: f64,
    pub max_retries: u32,
    pub resume: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            listing_url_template: LISTING_URL_TEMPLATE.to_string(),
            start_page: 1,
            end_page: DEFAULT_END_PAGE,
            output: PathBuf::from("poems.csv"),
            checkpoint: PathBuf::from("checkpoint.json"),
            delay_secs: 0.5,
            timeout_secs: 30.0,
            max_retries: 8,
            resume: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShortlistConfig {
    pub poems_csv: PathBuf,
    pub baseline: PathBuf,
    pub per_band: usize,
    pub output: PathBuf,
    pub seed: u64,
    pub timeout_secs: f64,
    pub delay_secs: f64,
    pub max_fetch: usize,
    pub max_retries: u32,
    pub cache_dir: PathBuf,
}

impl Default for ShortlistConfig {
    fn default() -> Self {
        Self {
            poems_csv: PathBuf::from("poems.csv"),
            baseline: PathBuf::from("mod.paragraphs"),
            per_band: 10,
            output: PathBuf::from("shortlist_candidates.csv"),
            seed: 42,
            timeout_secs: 20.0,
            delay_secs: 0.2,
            max_fetch: 300,
            max_retries: 3,
            cache_dir: PathBuf::from(".cache/poem_pages"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BandsConfig {
    pub shortlist: PathBuf,
    pub out_dir: PathBuf,
    pub target_per_band: usize,
    pub extract_attempts: u32,
}

impl Default for BandsConfig {
    fn default() -> Self {
        Self {
            shortlist: PathBuf::from("shortlist_candidates.csv"),
            out_dir: PathBuf::from("band_mods"),
            target_per_band: 10,
            extract_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), log_dir: None }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus text snapshot written after each command.
    pub snapshot: Option<PathBuf>,
}

impl Config {
    /// Load from `path`. A missing file is only tolerated when `required` is false.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        if !path.exists() {
            if required {
                return Err(HarvestError::Config(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            HarvestError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.harvest.listing_url_template.contains("{page}") {
            return Err(HarvestError::Config(
                "harvest.listing_url_template must contain {page}".to_string(),
            ));
        }
        for (name, secs) in [
            ("harvest.delay_secs", self.harvest.delay_secs),
            ("harvest.timeout_secs", self.harvest.timeout_secs),
            ("shortlist.delay_secs", self.shortlist.delay_secs),
            ("shortlist.timeout_secs", self.shortlist.timeout_secs),
        ] {
            if !(0.0..=MAX_CONFIG_SECS).contains(&secs) {
                return Err(HarvestError::Config(format!(
                    "{} must be between 0 and {} seconds",
                    name, MAX_CONFIG_SECS
                )));
            }
        }
        if self.harvest.start_page == 0 {
            return Err(HarvestError::Config("harvest.start_page must be at least 1".to_string()));
        }
        if self.harvest.end_page == u32::MAX {
            return Err(HarvestError::Config(format!("harvest.end_page must be below {}", u32::MAX)));
        }
        if self.harvest.max_retries == 0 || self.shortlist.max_retries == 0 {
            return Err(HarvestError::Config("max_retries must be at least 1".to_string()));
        }
        Ok(())
    }
}

pub fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}
