//! Core configuration types
//!
//! This module contains the main `FetchConfig` struct that drives both the
//! per-page fetcher and the orchestrator's retry loop.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retry::Backoff;
use crate::target::FetchTarget;

/// Main configuration struct for a fetch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Directory the default targets write into.
    ///
    /// **INVARIANT:** Always an absolute path (normalized in builder).
    pub(crate) output_dir: PathBuf,

    /// Pages to fetch, in order
    pub(crate) targets: Vec<FetchTarget>,

    pub(crate) headless: bool,

    /// Timeout in seconds from clicking export until the download completes
    ///
    /// Default: 120 seconds
    pub(crate) fetch_timeout_secs: u64,

    /// Timeout in seconds for `page.goto()` and the load event
    ///
    /// Default: 90 seconds
    pub(crate) navigation_timeout_secs: u64,

    /// Overall budget for resolving the export control
    ///
    /// Default: 30 seconds
    pub(crate) control_timeout_secs: u64,

    /// Budget for a single resolution strategy within one round
    ///
    /// Default: 10 seconds
    pub(crate) strategy_timeout_secs: u64,

    /// How long to look for the optional daily toggle
    ///
    /// Default: 5 seconds
    pub(crate) toggle_timeout_secs: u64,

    /// Settle buffer after navigation and after the toggle click
    ///
    /// Default: 2000 ms
    pub(crate) settle_delay_ms: u64,

    /// Attempts per target
    ///
    /// Default: 3
    pub(crate) max_attempts: u32,

    pub(crate) backoff: Backoff,

    /// Deadline over the whole run. `None` means unbounded.
    pub(crate) run_deadline_secs: Option<u64>,

    /// When set, page HTML is written here if the export control is not found
    pub(crate) debug_snapshot_dir: Option<PathBuf>,

    /// Explicit browser executable; otherwise discovered or downloaded
    pub(crate) chrome_executable: Option<PathBuf>,
}
