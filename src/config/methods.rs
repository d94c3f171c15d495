//! Builder methods available for all states
//!
//! This module contains methods that can be called on the builder
//! regardless of its current type state.

use std::path::PathBuf;
use std::time::Duration;

use super::builder::FetchConfigBuilder;
use crate::retry::Backoff;
use crate::target::FetchTarget;

impl<State> FetchConfigBuilder<State> {
    #[must_use]
    pub fn volume_page_url(mut self, url: impl Into<String>) -> Self {
        self.fields.volume_page_url = url.into();
        self
    }

    #[must_use]
    pub fn open_interest_page_url(mut self, url: impl Into<String>) -> Self {
        self.fields.open_interest_page_url = url.into();
        self
    }

    /// Override where the volume export is written (default: inside the output dir)
    #[must_use]
    pub fn volume_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.fields.volume_output = Some(path.into());
        self
    }

    /// Override where the open interest export is written
    #[must_use]
    pub fn open_interest_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.fields.open_interest_output = Some(path.into());
        self
    }

    /// Replace the two default targets with an explicit list
    ///
    /// The page URL and output overrides above are ignored when this is set.
    #[must_use]
    pub fn targets(mut self, targets: Vec<FetchTarget>) -> Self {
        self.fields.targets = Some(targets);
        self
    }

    /// Set browser headless mode (visible vs invisible browser window)
    ///
    /// Headless is the default. A visible window is useful when a dashboard
    /// changes its markup and the control strategies need to be revisited.
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.fields.headless = headless;
        self
    }

    #[must_use]
    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.fields.fetch_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn navigation_timeout_secs(mut self, secs: u64) -> Self {
        self.fields.navigation_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn control_timeout_secs(mut self, secs: u64) -> Self {
        self.fields.control_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn strategy_timeout_secs(mut self, secs: u64) -> Self {
        self.fields.strategy_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn toggle_timeout_secs(mut self, secs: u64) -> Self {
        self.fields.toggle_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn settle_delay_ms(mut self, ms: u64) -> Self {
        self.fields.settle_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.fields.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.fields.backoff = backoff;
        self
    }

    /// Shorthand for a fixed backoff of `secs` seconds
    #[must_use]
    pub fn retry_backoff_secs(mut self, secs: u64) -> Self {
        self.fields.backoff = Backoff::fixed(Duration::from_secs(secs));
        self
    }

    #[must_use]
    pub fn run_deadline_secs(mut self, secs: Option<u64>) -> Self {
        self.fields.run_deadline_secs = secs;
        self
    }

    #[must_use]
    pub fn debug_snapshot_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.fields.debug_snapshot_dir = dir;
        self
    }

    #[must_use]
    pub fn chrome_executable(mut self, path: Option<PathBuf>) -> Self {
        self.fields.chrome_executable = path;
        self
    }
}
