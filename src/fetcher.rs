//! Browser-driven CSV export fetcher
//!
//! One fetch is one isolated browser session: navigate, let the dashboard
//! render, optionally switch it to daily granularity, click the export
//! control while listening for the download, then move the file into place.

use chrono::Utc;
use chromiumoxide::page::Page;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::download::{DownloadWatcher, persist_download};
use crate::error::{FetchError, FetchResult};
use crate::page_timeout::with_page_timeout;
use crate::resolver::{ControlResolver, PageSurface, locate_control};
use crate::session::{BrowserSession, SessionOptions};
use crate::target::{DownloadResult, FetchTarget};
use crate::utils::constants::{
    CONTROL_LOCATE_ATTEMPTS, DEFAULT_CONTROL_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_SETTLE_DELAY_MS, DEFAULT_STRATEGY_TIMEOUT_SECS,
    DEFAULT_TOGGLE_TIMEOUT_SECS,
};

/// Something that can produce the export for one target
///
/// The orchestrator only talks to this trait, so tests can drive it with
/// scripted fetchers instead of a browser.
pub trait TargetFetcher {
    fn fetch(&self, target: &FetchTarget)
    -> impl Future<Output = FetchResult<DownloadResult>> + Send;
}

/// Per-attempt browser settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherOptions {
    pub headless: bool,
    pub chrome_executable: Option<PathBuf>,
    /// Budget for `goto` plus the load event
    pub navigation_timeout: Duration,
    /// Overall budget for locating the export control
    pub control_timeout: Duration,
    /// Budget for each resolution strategy within a round
    pub strategy_timeout: Duration,
    /// Budget for the optional daily toggle
    pub toggle_timeout: Duration,
    /// Budget from the click until the file is complete
    pub download_timeout: Duration,
    /// Pause after navigation and after toggling, for client-side rendering
    pub settle_delay: Duration,
    /// Where page HTML is dumped when the export control cannot be found
    pub debug_snapshot_dir: Option<PathBuf>,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            navigation_timeout: Duration::from_secs(DEFAULT_NAVIGATION_TIMEOUT_SECS),
            control_timeout: Duration::from_secs(DEFAULT_CONTROL_TIMEOUT_SECS),
            strategy_timeout: Duration::from_secs(DEFAULT_STRATEGY_TIMEOUT_SECS),
            toggle_timeout: Duration::from_secs(DEFAULT_TOGGLE_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            debug_snapshot_dir: None,
        }
    }
}

/// Downloads a dashboard's CSV export through a headless browser
#[derive(Debug, Clone, Default)]
pub struct PageCsvFetcher {
    options: FetcherOptions,
}

impl PageCsvFetcher {
    #[must_use]
    pub fn new(options: FetcherOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &FetcherOptions {
        &self.options
    }

    async fn fetch_in_session(
        &self,
        session: &BrowserSession,
        target: &FetchTarget,
    ) -> FetchResult<DownloadResult> {
        let page = session.new_page().await?;

        self.navigate(&page, &target.page_url).await?;
        tokio::time::sleep(self.options.settle_delay).await;

        let surface = PageSurface::new(&page);

        if let Some(label) = target.daily_toggle_label.as_deref() {
            self.select_daily(&page, &surface, label).await;
        }

        let resolver = ControlResolver::download_control(&target.download_button_label)?
            .strategy_timeout(self.options.strategy_timeout);
        let (resolver, surface, page_ref) = (&resolver, &surface, &page);
        let located = until_stable(CONTROL_LOCATE_ATTEMPTS, move |_| async move {
            let control = match resolver.resolve(surface, self.options.control_timeout).await {
                Ok(control) => control,
                Err(e) => {
                    self.save_debug_snapshot(page_ref, target).await;
                    return Err(e);
                }
            };
            locate_control(page_ref, &control).await
        })
        .await?;
        let Some(element) = located else {
            return Err(FetchError::Browser(format!(
                "export control '{}' kept re-rendering before it could be clicked",
                target.download_button_label
            )));
        };

        // Listen before clicking so the download event cannot be missed
        let watcher = DownloadWatcher::attach(session.browser()).await?;
        let click = async {
            element.click().await?;
            debug!(name = %target.name, "Clicked export control");
            Ok::<_, FetchError>(())
        };
        let ((), captured) = futures::future::try_join(
            click,
            watcher.wait(self.options.download_timeout, session.download_dir()),
        )
        .await?;

        persist_download(&captured, &target.output_path).await
    }

    async fn navigate(&self, page: &Page, url: &str) -> FetchResult<()> {
        info!("Navigating to {}", url);
        let timeout = self.options.navigation_timeout;
        with_page_timeout(
            async {
                let failed = |e: chromiumoxide::error::CdpError| FetchError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                };
                page.goto(url).await.map_err(failed)?;
                page.wait_for_navigation().await.map_err(failed)?;
                Ok(())
            },
            timeout,
            || FetchError::NavigationTimeout {
                url: url.to_string(),
                timeout,
            },
        )
        .await
    }

    /// Switch the chart to daily granularity when the toggle exists
    ///
    /// Absence is normal (some views have no toggle) and a failed click is
    /// not fatal; either way the export is attempted with whatever is shown.
    async fn select_daily(&self, page: &Page, surface: &PageSurface<'_>, label: &str) {
        let resolver =
            ControlResolver::exact_label(label).strategy_timeout(self.options.toggle_timeout);
        let Some(control) = resolver
            .try_resolve(surface, self.options.toggle_timeout)
            .await
        else {
            info!("No '{}' toggle on page, using default granularity", label);
            return;
        };

        let clicked = async {
            let Some(element) = locate_control(page, &control).await? else {
                return Ok(false);
            };
            element.click().await?;
            Ok::<_, FetchError>(true)
        }
        .await;

        match clicked {
            Ok(true) => {
                debug!("Selected '{}' granularity", label);
                tokio::time::sleep(self.options.settle_delay).await;
            }
            Ok(false) => warn!("'{}' toggle re-rendered before it could be clicked", label),
            Err(e) => warn!("Failed to click '{}' toggle: {}", label, e),
        }
    }

    /// Dump the page HTML for offline inspection of selector failures
    async fn save_debug_snapshot(&self, page: &Page, target: &FetchTarget) {
        let Some(dir) = self.options.debug_snapshot_dir.as_deref() else {
            return;
        };

        let html = match page.content().await {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not read page HTML for debug snapshot: {}", e);
                return;
            }
        };

        let path = dir.join(format!(
            "{}_{}.html",
            target.name,
            Utc::now().format("%Y%m%dT%H%M%S")
        ));
        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, html).await
        }
        .await;

        match written {
            Ok(()) => info!("Saved debug snapshot to {}", path.display()),
            Err(e) => warn!("Failed to save debug snapshot {}: {}", path.display(), e),
        }
    }
}

/// Run `attempt` until it yields a value, at most `attempts` times
///
/// `Ok(None)` means the page changed under the attempt and repeating it is
/// worthwhile. Errors end the loop at once.
async fn until_stable<T, F, Fut>(attempts: u32, mut attempt: F) -> FetchResult<Option<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = FetchResult<Option<T>>>,
{
    for n in 1..=attempts {
        if let Some(value) = attempt(n).await? {
            return Ok(Some(value));
        }
        debug!(attempt = n, "Control changed before it could be marked");
    }
    Ok(None)
}

/// Reject targets that could never succeed before paying for a browser launch
fn validate_target(target: &FetchTarget) -> FetchResult<()> {
    url::Url::parse(&target.page_url)
        .map_err(|e| FetchError::Config(format!("invalid page URL '{}': {e}", target.page_url)))?;
    if target.download_button_label.trim().is_empty() {
        return Err(FetchError::Config(format!(
            "target '{}' has an empty download label",
            target.name
        )));
    }
    if target.output_path.file_name().is_none() {
        return Err(FetchError::Config(format!(
            "target '{}' output path {} has no file name",
            target.name,
            target.output_path.display()
        )));
    }
    Ok(())
}

impl TargetFetcher for PageCsvFetcher {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult<DownloadResult> {
        validate_target(target)?;

        let session = BrowserSession::launch(&SessionOptions {
            headless: self.options.headless,
            executable: self.options.chrome_executable.clone(),
        })
        .await?;

        let result = self.fetch_in_session(&session, target).await;
        session.close().await;

        if let Ok(saved) = &result {
            info!(
                name = %target.name,
                bytes = saved.byte_size,
                "Fetched {}",
                saved.output_path.display()
            );
        }
        result
    }
}
