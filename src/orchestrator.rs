//! Runs every target through the fetcher under a shared retry policy
//!
//! Targets run one after another. A target that exhausts its retries does
//! not stop the others; the run as a whole fails if any target failed.

use std::time::Duration;
use tracing::{error, info};

use crate::config::FetchConfig;
use crate::error::{RetriesExhausted, RunError};
use crate::fetcher::TargetFetcher;
use crate::retry::{Retried, RetryPolicy, retry_with_backoff};
use crate::target::{DownloadResult, FetchTarget};

/// What happened to one target
#[derive(Debug)]
pub struct TargetOutcome {
    pub name: String,
    pub result: Result<Retried<DownloadResult>, RetriesExhausted>,
}

impl TargetOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Attempts used, successful or not
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match &self.result {
            Ok(done) => done.attempts,
            Err(exhausted) => exhausted.attempts,
        }
    }
}

/// Per-target outcomes of a run, in target order
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(TargetOutcome::is_success)
    }

    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Log one line per target
    pub fn log_summary(&self) {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(done) => info!(
                    name = %outcome.name,
                    attempts = done.attempts,
                    bytes = done.value.byte_size,
                    "OK {}",
                    done.value.output_path.display()
                ),
                Err(exhausted) => {
                    error!(
                        name = %outcome.name,
                        attempts = exhausted.attempts,
                        "FAILED: {}",
                        exhausted.last
                    );
                    for failure in &exhausted.failures {
                        error!(
                            name = %outcome.name,
                            attempt = failure.attempt,
                            kind = failure.kind,
                            "  {}",
                            failure.message
                        );
                    }
                }
            }
        }
    }

    /// Saved files, or `TargetsFailed` naming every failed target
    pub fn into_result(self) -> Result<Vec<DownloadResult>, RunError> {
        let total = self.outcomes.len();
        let failed: Vec<String> = self.failed().into_iter().map(str::to_string).collect();
        if !failed.is_empty() {
            return Err(RunError::TargetsFailed { failed, total });
        }
        Ok(self
            .outcomes
            .into_iter()
            .filter_map(|o| o.result.ok().map(|done| done.value))
            .collect())
    }
}

pub struct Orchestrator<F> {
    fetcher: F,
    targets: Vec<FetchTarget>,
    policy: RetryPolicy,
}

impl<F: TargetFetcher> Orchestrator<F> {
    #[must_use]
    pub fn new(fetcher: F, targets: Vec<FetchTarget>, policy: RetryPolicy) -> Self {
        Self {
            fetcher,
            targets,
            policy,
        }
    }

    /// Targets and retry policy taken from `config`
    #[must_use]
    pub fn from_config(fetcher: F, config: &FetchConfig) -> Self {
        Self::new(fetcher, config.targets().to_vec(), config.retry_policy())
    }

    #[must_use]
    pub fn targets(&self) -> &[FetchTarget] {
        &self.targets
    }

    /// Fetch every target, each under its own retry loop
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        let fetcher = &self.fetcher;

        for target in &self.targets {
            info!(
                name = %target.name,
                url = %target.page_url,
                "Fetching into {}",
                target.output_path.display()
            );
            let result = retry_with_backoff(&target.name, &self.policy, |_attempt| {
                fetcher.fetch(target)
            })
            .await;

            report.outcomes.push(TargetOutcome {
                name: target.name.clone(),
                result,
            });
        }

        report
    }

    /// [`run`](Self::run) bounded by an optional overall deadline
    ///
    /// On expiry the in-flight fetch is dropped, which tears down its
    /// browser session.
    pub async fn run_with_deadline(
        &self,
        deadline: Option<Duration>,
    ) -> Result<RunReport, RunError> {
        match deadline {
            None => Ok(self.run().await),
            Some(deadline) => tokio::time::timeout(deadline, self.run())
                .await
                .map_err(|_| RunError::DeadlineExceeded { deadline }),
        }
    }
}
