//! Bounded retry with backoff
//!
//! Every error is retried: the wrapper does not classify failures, so a
//! permanently broken target simply burns its attempts. Failed attempts are
//! recorded and returned alongside the outcome so callers can report them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{AttemptFailure, FetchError, RetriesExhausted};
use crate::utils::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF_SECS, MAX_RETRY_BACKOFF_SECS,
};

/// Delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Backoff {
    /// Same pause after every failed attempt
    Fixed { delay: Duration },
    /// `base * 2^(attempt-1)`, capped at `max`, plus up to `jitter` extra
    Exponential {
        base: Duration,
        max: Duration,
        jitter: Duration,
    },
}

impl Backoff {
    #[must_use]
    pub fn fixed(delay: Duration) -> Self {
        Self::Fixed { delay }
    }

    /// Exponential backoff starting at `base`, with up to one second of jitter
    #[must_use]
    pub fn exponential(base: Duration) -> Self {
        Self::Exponential {
            base,
            max: Duration::from_secs(MAX_RETRY_BACKOFF_SECS),
            jitter: Duration::from_secs(1),
        }
    }

    /// Pause after the given failed attempt (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, max, jitter } => {
                let exp = attempt.saturating_sub(1).min(16);
                let scaled = base.saturating_mul(1u32 << exp).min(max);
                let jitter_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
                if jitter_ms == 0 {
                    scaled
                } else {
                    scaled + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
                }
            }
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(DEFAULT_RETRY_BACKOFF_SECS))
    }
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// `max_attempts` below 1 is raised to 1
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Backoff::default())
    }
}

/// Successful outcome plus the failures that preceded it
#[derive(Debug, Clone)]
pub struct Retried<T> {
    pub value: T,
    /// Number of attempts used, including the successful one
    pub attempts: u32,
    pub failures: Vec<AttemptFailure>,
}

/// Run `op` until it succeeds or `policy.max_attempts` is reached
///
/// `op` receives the 1-based attempt number. Each failure is logged and
/// recorded; after the last attempt the final error is returned inside
/// [`RetriesExhausted`]. No backoff is slept after the final attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    label: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<Retried<T>, RetriesExhausted>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut failures = Vec::new();
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(label, attempt, "succeeded after {} failed attempt(s)", attempt - 1);
                }
                return Ok(Retried {
                    value,
                    attempts: attempt,
                    failures,
                });
            }
            Err(e) => {
                failures.push(AttemptFailure::new(attempt, &e));

                if attempt >= max_attempts {
                    warn!(
                        label,
                        attempt,
                        kind = e.kind(),
                        "max attempts ({max_attempts}) exhausted: {e}"
                    );
                    return Err(RetriesExhausted {
                        label: label.to_string(),
                        attempts: attempt,
                        failures,
                        last: e,
                    });
                }

                let delay = policy.backoff.delay_after(attempt);
                warn!(
                    label,
                    attempt,
                    kind = e.kind(),
                    "attempt {attempt}/{max_attempts} failed, retrying in {}ms: {e}",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
