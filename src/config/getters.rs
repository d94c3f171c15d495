//! Getter methods for `FetchConfig`
//!
//! Raw accessors plus the derived values (durations, retry policy, fetcher
//! options) the rest of the crate consumes.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::FetchConfig;
use crate::fetcher::FetcherOptions;
use crate::retry::{Backoff, RetryPolicy};
use crate::target::FetchTarget;

impl FetchConfig {
    #[must_use]
    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    #[must_use]
    pub fn targets(&self) -> &[FetchTarget] {
        &self.targets
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn control_timeout(&self) -> Duration {
        Duration::from_secs(self.control_timeout_secs)
    }

    #[must_use]
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_secs(self.strategy_timeout_secs)
    }

    #[must_use]
    pub fn toggle_timeout(&self) -> Duration {
        Duration::from_secs(self.toggle_timeout_secs)
    }

    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    #[must_use]
    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }

    #[must_use]
    pub fn debug_snapshot_dir(&self) -> Option<&Path> {
        self.debug_snapshot_dir.as_deref()
    }

    #[must_use]
    pub fn chrome_executable(&self) -> Option<&Path> {
        self.chrome_executable.as_deref()
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.backoff)
    }

    /// Per-page settings handed to `PageCsvFetcher`
    #[must_use]
    pub fn fetcher_options(&self) -> FetcherOptions {
        FetcherOptions {
            headless: self.headless,
            chrome_executable: self.chrome_executable.clone(),
            navigation_timeout: self.navigation_timeout(),
            control_timeout: self.control_timeout(),
            strategy_timeout: self.strategy_timeout(),
            toggle_timeout: self.toggle_timeout(),
            download_timeout: self.fetch_timeout(),
            settle_delay: self.settle_delay(),
            debug_snapshot_dir: self.debug_snapshot_dir.clone(),
        }
    }
}
