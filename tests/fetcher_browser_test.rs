//! End-to-end fetches against mock dashboards
//!
//! These drive a real Chrome/Chromium and are ignored by default.

use hl_perps_csv_fetch::{FetchError, FetcherOptions, PageCsvFetcher, TargetFetcher};
use std::time::Duration;

mod common;

use common::{
    SAMPLE_CSV, create_dashboard_html, create_dashboard_without_handler, create_html_mock,
    create_page_without_export, create_test_dir, setup_mock_server, test_target, test_url,
};

fn fast_options() -> FetcherOptions {
    FetcherOptions {
        navigation_timeout: Duration::from_secs(20),
        control_timeout: Duration::from_secs(3),
        strategy_timeout: Duration::from_secs(1),
        toggle_timeout: Duration::from_secs(1),
        download_timeout: Duration::from_secs(20),
        settle_delay: Duration::from_millis(200),
        ..FetcherOptions::default()
    }
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn test_fetch_downloads_csv_from_dashboard() {
    let mut server = setup_mock_server().await.unwrap();
    let _page = create_html_mock(&mut server, "/perps", &create_dashboard_html(true));
    let dir = create_test_dir().unwrap();
    let target = test_target("volume", &test_url(&server, "/perps"), dir.path());

    let fetcher = PageCsvFetcher::new(fast_options());
    let saved = fetcher.fetch(&target).await.unwrap();

    assert_eq!(saved.output_path, target.output_path);
    assert_eq!(saved.byte_size, SAMPLE_CSV.len() as u64);
    let content = common::assert_file_exists_with_content(&target.output_path)
        .await
        .unwrap();
    assert_eq!(content, SAMPLE_CSV);
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn test_fetch_without_toggle_still_downloads() {
    let mut server = setup_mock_server().await.unwrap();
    let _page = create_html_mock(&mut server, "/oi", &create_dashboard_html(false));
    let dir = create_test_dir().unwrap();
    let target = test_target("open_interest", &test_url(&server, "/oi"), dir.path());

    let saved = PageCsvFetcher::new(fast_options())
        .fetch(&target)
        .await
        .unwrap();
    assert!(saved.byte_size > 0);
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn test_missing_control_fails_and_writes_snapshot() {
    let mut server = setup_mock_server().await.unwrap();
    let _page = create_html_mock(&mut server, "/empty", &create_page_without_export());
    let dir = create_test_dir().unwrap();
    let snapshots = dir.path().join("snapshots");
    let target = test_target("volume", &test_url(&server, "/empty"), dir.path());

    let fetcher = PageCsvFetcher::new(FetcherOptions {
        debug_snapshot_dir: Some(snapshots.clone()),
        ..fast_options()
    });
    let err = fetcher.fetch(&target).await.unwrap_err();

    assert!(matches!(err, FetchError::ControlNotFound { .. }), "got {err:?}");
    assert!(!target.output_path.exists());
    let dumped = std::fs::read_dir(&snapshots).unwrap().count();
    assert_eq!(dumped, 1);
}

#[tokio::test]
#[ignore] // Requires browser installation
async fn test_click_without_download_times_out() {
    let mut server = setup_mock_server().await.unwrap();
    let _page = create_html_mock(&mut server, "/dead", &create_dashboard_without_handler());
    let dir = create_test_dir().unwrap();
    let target = test_target("volume", &test_url(&server, "/dead"), dir.path());

    let fetcher = PageCsvFetcher::new(FetcherOptions {
        download_timeout: Duration::from_secs(2),
        ..fast_options()
    });
    let err = fetcher.fetch(&target).await.unwrap_err();

    assert!(matches!(err, FetchError::DownloadTimeout { .. }), "got {err:?}");
    assert!(!target.output_path.exists());
}
