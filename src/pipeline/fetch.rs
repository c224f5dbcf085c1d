use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, warn};

use crate::app::ports::{DocumentSource, HttpClientPort, HttpGetResult, SleepPort, TransportError};
use crate::constants::{MAX_BACKOFF_SECS, TRANSIENT_STATUSES};
use crate::error::{FetchError, FetchErrorKind};
use crate::metrics::FetchMetrics;

/// Result of a single GET, decided before any retry bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Vec<u8>),
    Transient { reason: String, retry_after: Option<String> },
    Fatal(String),
}

impl FetchOutcome {
    pub fn from_response(result: Result<HttpGetResult, TransportError>) -> Self {
        match result {
            Ok(resp) if resp.status == 200 => FetchOutcome::Success(resp.bytes),
            Ok(resp) => {
                let reason = if TRANSIENT_STATUSES.contains(&resp.status) {
                    format!("transient HTTP {}", resp.status)
                } else {
                    format!("HTTP error {}", resp.status)
                };
                FetchOutcome::Transient { reason, retry_after: resp.retry_after }
            }
            Err(e) if e.is_retryable() => {
                FetchOutcome::Transient { reason: e.to_string(), retry_after: None }
            }
            Err(e) => FetchOutcome::Fatal(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FetchPolicy {
    /// Total attempts, including the first.
    pub max_retries: u32,
    /// Seconds; drives the exponential backoff and its jitter.
    pub base_delay: f64,
}

/// A server-supplied delay wins when it is a representable number of seconds > 0.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    let secs: f64 = value?.trim().parse().ok()?;
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// Lower bound of the wait for `attempt` (1-based) without jitter.
pub fn exponential_component(attempt: u32, base_delay: f64) -> f64 {
    let exponent = attempt.saturating_sub(1).min(1024) as i32;
    (base_delay * 2f64.powi(exponent)).min(MAX_BACKOFF_SECS)
}

pub fn compute_backoff<R: Rng>(
    retry_after: Option<&str>,
    attempt: u32,
    base_delay: f64,
    rng: &mut R,
) -> Duration {
    if let Some(wait) = parse_retry_after(retry_after) {
        return wait;
    }
    let jitter = rng.gen_range(0.0..=(0.5 * base_delay + 0.1));
    Duration::from_secs_f64(exponential_component(attempt, base_delay) + jitter)
}

pub struct FetchEngine<H, S> {
    http: H,
    sleeper: S,
    policy: FetchPolicy,
    rng: StdRng,
}

impl<H: HttpClientPort, S: SleepPort> FetchEngine<H, S> {
    pub fn new(http: H, sleeper: S, policy: FetchPolicy, seed: u64) -> Self {
        Self { http, sleeper, policy, rng: StdRng::seed_from_u64(seed) }
    }

    /// GET `url` until it returns 200 or the attempt budget runs out.
    pub fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        let max = self.policy.max_retries.max(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=max {
            FetchMetrics::attempt();
            match FetchOutcome::from_response(self.http.get(url)) {
                FetchOutcome::Success(bytes) => {
                    debug!(url, attempt, bytes = bytes.len(), "fetched");
                    return Ok(bytes);
                }
                FetchOutcome::Fatal(reason) => {
                    return Err(FetchError {
                        url: url.to_string(),
                        attempts: attempt,
                        kind: FetchErrorKind::Fatal,
                        last_error: reason,
                    });
                }
                FetchOutcome::Transient { reason, retry_after } => {
                    if attempt == max {
                        last_error = reason;
                        break;
                    }
                    let wait = compute_backoff(
                        retry_after.as_deref(),
                        attempt,
                        self.policy.base_delay,
                        &mut self.rng,
                    );
                    warn!(
                        "{} for {} (attempt {}/{}). Waiting {:.2}s.",
                        reason,
                        url,
                        attempt,
                        max,
                        wait.as_secs_f64()
                    );
                    FetchMetrics::retry(wait.as_secs_f64());
                    last_error = reason;
                    self.sleeper.sleep(wait);
                }
            }
        }

        FetchMetrics::exhausted();
        Err(FetchError {
            url: url.to_string(),
            attempts: max,
            kind: FetchErrorKind::Exhausted,
            last_error,
        })
    }
}

impl<H: HttpClientPort, S: SleepPort> DocumentSource for FetchEngine<H, S> {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, FetchError> {
        FetchEngine::fetch(self, url)
    }
}
