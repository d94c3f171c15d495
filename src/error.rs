//! Error types for fetch operations
//!
//! `FetchError` covers one attempt against one page. The retry wrapper turns
//! a run of failed attempts into `RetriesExhausted`, and the orchestrator
//! reports process-level failure through `RunError`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for a single fetch attempt
pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    /// The page did not finish loading in time
    #[error("navigation to {url} timed out after {}s", .timeout.as_secs())]
    NavigationTimeout { url: String, timeout: Duration },

    /// The browser refused or aborted the navigation
    #[error("navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// No resolution strategy found the control within the budget
    #[error("control '{control}' not found after {}s (tried: {})", .timeout.as_secs(), .tried.join(", "))]
    ControlNotFound {
        control: String,
        tried: Vec<String>,
        timeout: Duration,
    },

    /// The page never started a download after the control was clicked
    #[error("download did not start within {}s", .timeout.as_secs())]
    DownloadTimeout { timeout: Duration },

    /// The download started but produced no usable artifact
    #[error("download incomplete: {0}")]
    DownloadIncomplete(String),

    /// Filesystem failure while persisting the artifact
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Browser launch or DevTools protocol failure
    #[error("browser error: {0}")]
    Browser(String),

    /// Invalid target or fetcher configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl FetchError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly name of the variant, used in log fields
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NavigationTimeout { .. } => "navigation_timeout",
            Self::Navigation { .. } => "navigation",
            Self::ControlNotFound { .. } => "control_not_found",
            Self::DownloadTimeout { .. } => "download_timeout",
            Self::DownloadIncomplete(_) => "download_incomplete",
            Self::Io { .. } => "io",
            Self::Browser(_) => "browser",
            Self::Config(_) => "config",
        }
    }
}

impl From<chromiumoxide::error::CdpError> for FetchError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Browser(format!("{err:#}"))
    }
}

/// One failed attempt as recorded by the retry wrapper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// 1-based attempt number
    pub attempt: u32,
    /// Variant name of the error (see [`FetchError::kind`])
    pub kind: &'static str,
    /// Rendered error message
    pub message: String,
}

impl AttemptFailure {
    #[must_use]
    pub fn new(attempt: u32, error: &FetchError) -> Self {
        Self {
            attempt,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Every attempt for a target failed
#[derive(Debug, Error)]
#[error("{label}: all {attempts} attempts failed, last error: {last}")]
pub struct RetriesExhausted {
    /// Which target (or operation) was retried
    pub label: String,
    /// Number of attempts made
    pub attempts: u32,
    /// One entry per failed attempt, in order
    pub failures: Vec<AttemptFailure>,
    /// Error of the final attempt
    #[source]
    pub last: FetchError,
}

/// Process-level failure of an orchestrator run
#[derive(Debug, Error)]
pub enum RunError {
    /// At least one target exhausted its retries
    #[error("{} of {total} targets failed: {}", .failed.len(), .failed.join(", "))]
    TargetsFailed { failed: Vec<String>, total: usize },

    /// The overall run deadline elapsed
    #[error("run deadline of {}s exceeded", .deadline.as_secs())]
    DeadlineExceeded { deadline: Duration },
}
