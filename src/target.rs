//! Fetch targets and download results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::constants::{
    DAILY_TOGGLE_LABEL, DEFAULT_OPEN_INTEREST_PAGE_URL, DEFAULT_VOLUME_PAGE_URL,
    DOWNLOAD_BUTTON_LABEL, OPEN_INTEREST_CSV_FILE, VOLUME_CSV_FILE,
};

/// One page to visit and the file its export should land in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchTarget {
    /// Short name used in logs and reports (e.g. `volume`)
    pub name: String,
    pub page_url: String,
    pub output_path: PathBuf,
    /// Exact visible label of the granularity toggle, if the page has one
    pub daily_toggle_label: Option<String>,
    /// Visible label of the export control
    pub download_button_label: String,
}

impl FetchTarget {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        page_url: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            page_url: page_url.into(),
            output_path: output_path.into(),
            daily_toggle_label: Some(DAILY_TOGGLE_LABEL.to_string()),
            download_button_label: DOWNLOAD_BUTTON_LABEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_daily_toggle(mut self, label: Option<impl Into<String>>) -> Self {
        self.daily_toggle_label = label.map(Into::into);
        self
    }

    #[must_use]
    pub fn with_download_label(mut self, label: impl Into<String>) -> Self {
        self.download_button_label = label.into();
        self
    }

    /// Perps volume export, written to `<dir>/hyperliquid_perps_volume.csv`
    #[must_use]
    pub fn volume(dir: &Path) -> Self {
        Self::new("volume", DEFAULT_VOLUME_PAGE_URL, dir.join(VOLUME_CSV_FILE))
    }

    /// Open interest export, written to `<dir>/hyperliquid_perps_open_interest.csv`
    #[must_use]
    pub fn open_interest(dir: &Path) -> Self {
        Self::new(
            "open_interest",
            DEFAULT_OPEN_INTEREST_PAGE_URL,
            dir.join(OPEN_INTEREST_CSV_FILE),
        )
    }
}

/// A saved export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub output_path: PathBuf,
    pub byte_size: u64,
    /// When the file was written
    pub timestamp: DateTime<Utc>,
    /// Download URL reported by the browser (often a `blob:` or `data:` URL)
    pub source_url: Option<String>,
    /// File name the page suggested for the download
    pub suggested_filename: Option<String>,
}
