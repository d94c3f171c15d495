//! Scoped browser session for a single fetch
//!
//! A session owns one browser process, its CDP handler task, a private
//! profile directory and a private download directory. Downloads are
//! captured into that directory instead of the system download folder.
//!
//! Call [`BrowserSession::close`] on every exit path; `Drop` is a fallback
//! that aborts the handler and lets the temp dirs clean themselves up.

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::page::Page;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::browser_setup::{LaunchOptions, launch_browser};
use crate::error::{FetchError, FetchResult};
use crate::utils::BROWSER_CLOSE_TIMEOUT_SECS;

/// Settings for a browser session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub headless: bool,
    pub executable: Option<PathBuf>,
}

pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: Option<TempDir>,
    download_dir: Option<TempDir>,
    download_path: PathBuf,
    closed: bool,
}

impl BrowserSession {
    /// Launch a browser with isolated profile and download directories
    ///
    /// Download capture is switched on before this returns, so any page
    /// opened from the session writes its downloads into
    /// [`download_dir`](Self::download_dir), named by download GUID.
    pub async fn launch(options: &SessionOptions) -> FetchResult<Self> {
        let profile_dir = tempfile::Builder::new()
            .prefix("hl_perps_profile_")
            .tempdir()
            .map_err(|e| FetchError::io(std::env::temp_dir(), e))?;
        let download_dir = tempfile::Builder::new()
            .prefix("hl_perps_downloads_")
            .tempdir()
            .map_err(|e| FetchError::io(std::env::temp_dir(), e))?;
        let download_path = download_dir.path().to_path_buf();

        let (browser, handler) = launch_browser(&LaunchOptions {
            headless: options.headless,
            executable: options.executable.clone(),
            user_data_dir: profile_dir.path().to_path_buf(),
        })
        .await?;

        let mut session = Self {
            browser,
            handler,
            profile_dir: Some(profile_dir),
            download_dir: Some(download_dir),
            download_path,
            closed: false,
        };

        if let Err(e) = session.enable_download_capture().await {
            session.close().await;
            return Err(e);
        }

        Ok(session)
    }

    async fn enable_download_capture(&mut self) -> FetchResult<()> {
        let params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::AllowAndName)
            .download_path(self.download_path.to_string_lossy().into_owned())
            .events_enabled(true)
            .build()
            .map_err(FetchError::Browser)?;

        self.browser.execute(params).await?;
        debug!(
            "Download capture enabled into {}",
            self.download_path.display()
        );
        Ok(())
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Directory the browser writes downloads into
    pub fn download_dir(&self) -> &Path {
        &self.download_path
    }

    /// Open a blank tab
    pub async fn new_page(&self) -> FetchResult<Page> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    /// Close the browser, wait for the process to exit and remove temp dirs
    ///
    /// Best effort: failures are logged, never returned, so cleanup can run
    /// on error paths without masking the original error. A browser that
    /// does not exit within [`BROWSER_CLOSE_TIMEOUT_SECS`] is killed.
    pub async fn close(mut self) {
        let grace = Duration::from_secs(BROWSER_CLOSE_TIMEOUT_SECS);
        let outcome = shut_down(&mut self.browser, grace).await;
        self.handler.abort();
        self.cleanup_temp_dirs();
        self.closed = true;
        info!("Browser session closed ({:?})", outcome);
    }

    /// Remove the profile and download dirs
    ///
    /// MUST run after the browser process exited, Windows refuses to remove
    /// files Chrome still holds open.
    fn cleanup_temp_dirs(&mut self) {
        for dir in [self.download_dir.take(), self.profile_dir.take()]
            .into_iter()
            .flatten()
        {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

/// How the browser process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shutdown {
    Exited,
    Killed,
}

/// The lifecycle calls [`shut_down`] needs from a browser process
pub(crate) trait BrowserProcess {
    async fn request_close(&mut self) -> Result<(), String>;
    async fn wait_exit(&mut self) -> std::io::Result<()>;
    async fn force_kill(&mut self) -> Option<std::io::Result<()>>;
}

impl BrowserProcess for Browser {
    async fn request_close(&mut self) -> Result<(), String> {
        self.close().await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait_exit(&mut self) -> std::io::Result<()> {
        self.wait().await.map(|_| ())
    }

    async fn force_kill(&mut self) -> Option<std::io::Result<()>> {
        self.kill().await
    }
}

/// Ask the process to close and wait up to `grace` for it to exit
///
/// Falls back to killing the process when the close request fails, or when
/// either the request or the exit does not complete within `grace`.
pub(crate) async fn shut_down<P: BrowserProcess>(process: &mut P, grace: Duration) -> Shutdown {
    let closed = match tokio::time::timeout(grace, process.request_close()).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Failed to close browser cleanly: {}", e);
            false
        }
        Err(_) => {
            warn!("Browser close request timed out after {:?}", grace);
            false
        }
    };

    if closed {
        match tokio::time::timeout(grace, process.wait_exit()).await {
            Ok(Ok(())) => return Shutdown::Exited,
            Ok(Err(e)) => warn!("Failed to wait for browser exit: {}", e),
            Err(_) => warn!("Browser did not exit within {:?}, killing it", grace),
        }
    }

    if let Some(Err(e)) = process.force_kill().await {
        warn!("Failed to kill browser process: {}", e);
    }
    Shutdown::Killed
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!("BrowserSession dropped without close() - aborting handler task");
        self.handler.abort();
        // Browser::drop() kills the Chrome process; the TempDirs remove
        // themselves when dropped below.
    }
}
