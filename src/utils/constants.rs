//! Shared configuration constants for the fetcher
//!
//! Default values for every knob `FetchConfig` exposes, kept here so the
//! builder, the environment loader and the tests agree on them.

/// Default output directory (relative to the working directory) when neither
/// `HL_DATA_DIR` nor `GITHUB_WORKSPACE` is set.
pub const DEFAULT_DATA_DIR: &str = "data";

/// File name of the perpetual-futures volume export
pub const VOLUME_CSV_FILE: &str = "hyperliquid_perps_volume.csv";

/// File name of the open-interest export
pub const OPEN_INTEREST_CSV_FILE: &str = "hyperliquid_perps_open_interest.csv";

/// Perps volume dashboard
pub const DEFAULT_VOLUME_PAGE_URL: &str = "https://defillama.com/perps";

/// Open interest dashboard
pub const DEFAULT_OPEN_INTEREST_PAGE_URL: &str = "https://defillama.com/open-interest";

/// Visible label of the export control on both dashboards
pub const DOWNLOAD_BUTTON_LABEL: &str = "Download .csv";

/// Visible label of the daily granularity toggle
pub const DAILY_TOGGLE_LABEL: &str = "D";

/// Budget from clicking the export control until the file is complete.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

/// How long `page.goto()` may take before the attempt is abandoned.
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 90;

/// Overall budget for resolving the export control across all strategies.
pub const DEFAULT_CONTROL_TIMEOUT_SECS: u64 = 30;

/// Per-strategy slice of the control budget.
pub const DEFAULT_STRATEGY_TIMEOUT_SECS: u64 = 10;

/// The daily toggle is optional, so it gets a short look only.
pub const DEFAULT_TOGGLE_TIMEOUT_SECS: u64 = 5;

/// Settle buffer after navigation and after clicking the toggle.
///
/// Client-rendered dashboards attach click handlers after the elements show
/// up, so a short pause follows the explicit readiness waits.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2_000;

/// DOM polling interval while waiting for a control to render
pub const CONTROL_POLL_INTERVAL_MS: u64 = 250;

/// Times a control is resolved again when it re-renders before the click
pub const CONTROL_LOCATE_ATTEMPTS: u32 = 3;

/// Attempts per target before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed pause between attempts
pub const DEFAULT_RETRY_BACKOFF_SECS: u64 = 5;

/// Upper bound for exponential backoff
pub const MAX_RETRY_BACKOFF_SECS: u64 = 60;

/// CDP request timeout for the browser connection
pub const BROWSER_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Grace period for a closing browser to exit before it is killed
pub const BROWSER_CLOSE_TIMEOUT_SECS: u64 = 5;

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
