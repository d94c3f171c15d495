//! Environment loader for `FetchConfig`
//!
//! Every knob is optional; unset variables fall back to the builder
//! defaults. Malformed values are rejected rather than ignored.

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::types::FetchConfig;
use crate::retry::Backoff;
use crate::utils::{DEFAULT_DATA_DIR, DEFAULT_RETRY_BACKOFF_SECS};

pub const ENV_DATA_DIR: &str = "HL_DATA_DIR";
pub const ENV_WORKSPACE: &str = "GITHUB_WORKSPACE";
pub const ENV_VOLUME_CSV: &str = "VOLUME_CSV";
pub const ENV_OI_CSV: &str = "OI_CSV";
pub const ENV_VOLUME_PAGE_URL: &str = "VOLUME_PAGE_URL";
pub const ENV_OI_PAGE_URL: &str = "OI_PAGE_URL";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "FETCH_TIMEOUT_SECS";
pub const ENV_NAVIGATION_TIMEOUT_SECS: &str = "NAVIGATION_TIMEOUT_SECS";
pub const ENV_CONTROL_TIMEOUT_SECS: &str = "CONTROL_TIMEOUT_SECS";
pub const ENV_SETTLE_DELAY_MS: &str = "SETTLE_DELAY_MS";
pub const ENV_HEADLESS: &str = "HEADLESS";
pub const ENV_MAX_ATTEMPTS: &str = "MAX_ATTEMPTS";
pub const ENV_RETRY_BACKOFF_SECS: &str = "RETRY_BACKOFF_SECS";
pub const ENV_RETRY_BACKOFF: &str = "RETRY_BACKOFF";
pub const ENV_RUN_DEADLINE_SECS: &str = "RUN_DEADLINE_SECS";
pub const ENV_DEBUG_SNAPSHOT_DIR: &str = "DEBUG_SNAPSHOT_DIR";
pub const ENV_CHROMIUM_PATH: &str = "CHROMIUM_PATH";

impl FetchConfig {
    /// Build a config from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let output_dir = match (get(ENV_DATA_DIR), get(ENV_WORKSPACE)) {
            (Some(dir), _) => PathBuf::from(dir),
            (None, Some(workspace)) => PathBuf::from(workspace).join(DEFAULT_DATA_DIR),
            (None, None) => PathBuf::from(DEFAULT_DATA_DIR),
        };

        let mut builder = Self::builder().output_dir(output_dir);

        if let Some(url) = get(ENV_VOLUME_PAGE_URL) {
            builder = builder.volume_page_url(url);
        }
        if let Some(url) = get(ENV_OI_PAGE_URL) {
            builder = builder.open_interest_page_url(url);
        }
        if let Some(path) = get(ENV_VOLUME_CSV) {
            builder = builder.volume_output(path);
        }
        if let Some(path) = get(ENV_OI_CSV) {
            builder = builder.open_interest_output(path);
        }
        if let Some(secs) = parse_opt::<u64>(ENV_FETCH_TIMEOUT_SECS, get(ENV_FETCH_TIMEOUT_SECS))? {
            builder = builder.fetch_timeout_secs(secs);
        }
        if let Some(secs) =
            parse_opt::<u64>(ENV_NAVIGATION_TIMEOUT_SECS, get(ENV_NAVIGATION_TIMEOUT_SECS))?
        {
            builder = builder.navigation_timeout_secs(secs);
        }
        if let Some(secs) =
            parse_opt::<u64>(ENV_CONTROL_TIMEOUT_SECS, get(ENV_CONTROL_TIMEOUT_SECS))?
        {
            builder = builder.control_timeout_secs(secs);
        }
        if let Some(ms) = parse_opt::<u64>(ENV_SETTLE_DELAY_MS, get(ENV_SETTLE_DELAY_MS))? {
            builder = builder.settle_delay_ms(ms);
        }
        if let Some(raw) = get(ENV_HEADLESS) {
            builder = builder.headless(parse_bool(ENV_HEADLESS, &raw)?);
        }
        if let Some(n) = parse_opt::<u32>(ENV_MAX_ATTEMPTS, get(ENV_MAX_ATTEMPTS))? {
            builder = builder.max_attempts(n);
        }

        let backoff_secs = parse_opt::<u64>(ENV_RETRY_BACKOFF_SECS, get(ENV_RETRY_BACKOFF_SECS))?
            .unwrap_or(DEFAULT_RETRY_BACKOFF_SECS);
        let base = Duration::from_secs(backoff_secs);
        let backoff = match get(ENV_RETRY_BACKOFF).as_deref().map(str::trim) {
            None => Backoff::fixed(base),
            Some(kind) if kind.eq_ignore_ascii_case("fixed") => Backoff::fixed(base),
            Some(kind) if kind.eq_ignore_ascii_case("exponential") => Backoff::exponential(base),
            Some(other) => {
                bail!("{ENV_RETRY_BACKOFF} must be 'fixed' or 'exponential', got '{other}'")
            }
        };
        builder = builder.backoff(backoff);

        builder = builder
            .run_deadline_secs(parse_opt::<u64>(
                ENV_RUN_DEADLINE_SECS,
                get(ENV_RUN_DEADLINE_SECS),
            )?)
            .debug_snapshot_dir(get(ENV_DEBUG_SNAPSHOT_DIR).map(PathBuf::from))
            .chrome_executable(get(ENV_CHROMIUM_PATH).map(PathBuf::from));

        builder.build()
    }
}

fn parse_opt<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.map(|v| {
        v.trim()
            .parse::<T>()
            .with_context(|| format!("{key} has invalid value '{v}'"))
    })
    .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be a boolean, got '{other}'"),
    }
}
