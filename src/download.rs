//! Download capture and atomic persistence
//!
//! The browser runs with `Browser.setDownloadBehavior(allowAndName)`, so a
//! download lands in the session's download directory under its GUID. The
//! watcher pairs `downloadWillBegin` with the terminal `downloadProgress`
//! event for the same GUID; only a `completed` download with a non-empty
//! file counts.

use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
};
use chromiumoxide::listeners::EventStream;
use chrono::Utc;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, trace, warn};

use crate::error::{FetchError, FetchResult};
use crate::target::DownloadResult;

/// A finished download still sitting in the browser's download directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDownload {
    pub path: PathBuf,
    pub url: String,
    pub suggested_filename: String,
}

/// Listens for browser download events
///
/// Attach before clicking: events that fire before the listener exists are
/// lost.
pub struct DownloadWatcher {
    will_begin: EventStream<EventDownloadWillBegin>,
    progress: EventStream<EventDownloadProgress>,
}

impl DownloadWatcher {
    pub async fn attach(browser: &Browser) -> FetchResult<Self> {
        let will_begin = browser.event_listener::<EventDownloadWillBegin>().await?;
        let progress = browser.event_listener::<EventDownloadProgress>().await?;
        Ok(Self {
            will_begin,
            progress,
        })
    }

    /// Wait for the next download to finish
    ///
    /// `DownloadTimeout` when no download starts within `timeout`;
    /// `DownloadIncomplete` when it starts but is canceled, stalls past the
    /// same deadline, or leaves no usable file in `download_dir`.
    pub async fn wait(
        mut self,
        timeout: Duration,
        download_dir: &Path,
    ) -> FetchResult<CapturedDownload> {
        let deadline = Instant::now() + timeout;

        let begin = match timeout_at(deadline, self.will_begin.next()).await {
            Err(_) => return Err(FetchError::DownloadTimeout { timeout }),
            Ok(None) => {
                return Err(FetchError::DownloadIncomplete(
                    "download event stream closed before the download started".into(),
                ));
            }
            Ok(Some(event)) => event,
        };
        info!(
            guid = %begin.guid,
            suggested = %begin.suggested_filename,
            "Download started"
        );

        loop {
            let event = match timeout_at(deadline, self.progress.next()).await {
                Err(_) => {
                    return Err(FetchError::DownloadIncomplete(format!(
                        "download {} did not finish within {}s",
                        begin.guid,
                        timeout.as_secs()
                    )));
                }
                Ok(None) => {
                    return Err(FetchError::DownloadIncomplete(
                        "download event stream closed mid-download".into(),
                    ));
                }
                Ok(Some(event)) => event,
            };

            if event.guid != begin.guid {
                continue;
            }
            match event.state {
                DownloadProgressState::Completed => break,
                DownloadProgressState::Canceled => {
                    return Err(FetchError::DownloadIncomplete(format!(
                        "download {} was canceled",
                        begin.guid
                    )));
                }
                DownloadProgressState::InProgress => {
                    trace!(
                        received = event.received_bytes,
                        total = event.total_bytes,
                        "Download progress"
                    );
                }
            }
        }

        let path = download_dir.join(&begin.guid);
        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                return Err(FetchError::DownloadIncomplete(format!(
                    "completed download missing at {}: {e}",
                    path.display()
                )));
            }
        };
        if size == 0 {
            return Err(FetchError::DownloadIncomplete(
                "download completed with an empty file".into(),
            ));
        }
        debug!(bytes = size, "Download completed at {}", path.display());

        Ok(CapturedDownload {
            path,
            url: begin.url.clone(),
            suggested_filename: begin.suggested_filename.clone(),
        })
    }
}

/// Sibling path the artifact is staged at before the final rename
#[must_use]
pub fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    dest.with_file_name(name)
}

/// Copy a finished download to `dest` atomically
///
/// The bytes are staged in `<dest>.partial` and renamed over `dest`, so a
/// reader sees either the previous file or the complete new one. The staging
/// file is removed on failure.
pub async fn persist_download(
    captured: &CapturedDownload,
    dest: &Path,
) -> FetchResult<DownloadResult> {
    if let Some(parent) = dest.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| FetchError::io(parent, e))?;
    }

    let staging = partial_path(dest);
    let staged = stage_and_rename(&captured.path, &staging, dest).await;

    let byte_size = match staged {
        Ok(size) => size,
        Err(e) => {
            if let Err(cleanup) = tokio::fs::remove_file(&staging).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e);
        }
    };

    info!(bytes = byte_size, "Saved {}", dest.display());

    Ok(DownloadResult {
        output_path: dest.to_path_buf(),
        byte_size,
        timestamp: Utc::now(),
        source_url: Some(captured.url.clone()).filter(|u| !u.is_empty()),
        suggested_filename: Some(captured.suggested_filename.clone()).filter(|f| !f.is_empty()),
    })
}

async fn stage_and_rename(src: &Path, staging: &Path, dest: &Path) -> FetchResult<u64> {
    let size = tokio::fs::copy(src, staging)
        .await
        .map_err(|e| FetchError::io(src, e))?;
    if size == 0 {
        return Err(FetchError::DownloadIncomplete(format!(
            "{} is empty",
            src.display()
        )));
    }
    tokio::fs::rename(staging, dest)
        .await
        .map_err(|e| FetchError::io(dest, e))?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn captured(path: PathBuf) -> CapturedDownload {
        CapturedDownload {
            path,
            url: "blob:https://defillama.com/1234".into(),
            suggested_filename: "perps.csv".into(),
        }
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/data/volume.csv")),
            PathBuf::from("/data/volume.csv.partial")
        );
    }

    #[tokio::test]
    async fn persist_creates_parent_and_leaves_no_partial() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("guid");
        std::fs::write(&src, "date,volume\n2024-01-01,1\n").unwrap();
        let dest = tmp.path().join("nested/out/volume.csv");

        let result = persist_download(&captured(src), &dest).await.unwrap();

        assert_eq!(result.output_path, dest);
        assert_eq!(result.byte_size, 25);
        assert_eq!(result.suggested_filename.as_deref(), Some("perps.csv"));
        assert_eq!(
            std::fs::read_to_string(&dest).unwrap(),
            "date,volume\n2024-01-01,1\n"
        );
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn persist_replaces_existing_file() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("guid");
        let dest = tmp.path().join("volume.csv");
        std::fs::write(&dest, "old").unwrap();
        std::fs::write(&src, "new,data").unwrap();

        persist_download(&captured(src), &dest).await.unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "new,data");
    }

    #[tokio::test]
    async fn failed_persist_keeps_previous_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("volume.csv");
        std::fs::write(&dest, "previous").unwrap();

        let err = persist_download(&captured(tmp.path().join("missing")), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Io { .. }));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");
        assert!(!partial_path(&dest).exists());
    }

    #[tokio::test]
    async fn empty_download_is_incomplete() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("guid");
        std::fs::write(&src, "").unwrap();
        let dest = tmp.path().join("volume.csv");

        let err = persist_download(&captured(src), &dest).await.unwrap_err();
        assert!(matches!(err, FetchError::DownloadIncomplete(_)));
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }
}
