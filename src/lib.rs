pub mod browser_setup;
pub mod config;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod page_timeout;
pub mod resolver;
pub mod retry;
pub mod session;
pub mod target;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{FetchConfig, FetchConfigBuilder};
pub use download::{CapturedDownload, DownloadWatcher, persist_download};
pub use error::{AttemptFailure, FetchError, FetchResult, RetriesExhausted, RunError};
pub use fetcher::{FetcherOptions, PageCsvFetcher, TargetFetcher};
pub use orchestrator::{Orchestrator, RunReport, TargetOutcome};
pub use resolver::{ControlResolver, DomSurface, NodeInfo, ResolvedControl, StaticDom};
pub use retry::{Backoff, Retried, RetryPolicy, retry_with_backoff};
pub use session::{BrowserSession, SessionOptions};
pub use target::{DownloadResult, FetchTarget};

/// Fetch every configured target and fail if any of them failed
pub async fn fetch_all(config: &FetchConfig) -> Result<Vec<DownloadResult>, RunError> {
    let fetcher = PageCsvFetcher::new(config.fetcher_options());
    let orchestrator = Orchestrator::from_config(fetcher, config);
    let report = orchestrator.run_with_deadline(config.run_deadline()).await?;
    report.log_summary();
    report.into_result()
}
