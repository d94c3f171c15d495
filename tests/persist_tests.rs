//! Atomic persistence of captured downloads

use hl_perps_csv_fetch::download::{CapturedDownload, partial_path, persist_download};
use hl_perps_csv_fetch::FetchError;

mod common;

use common::{SAMPLE_CSV, create_test_dir};

fn captured(path: std::path::PathBuf) -> CapturedDownload {
    CapturedDownload {
        path,
        url: "data:text/csv;charset=utf-8,...".into(),
        suggested_filename: String::new(),
    }
}

#[tokio::test]
async fn test_failed_persist_leaves_nothing_at_output_path() {
    let dir = create_test_dir().unwrap();
    let dest = dir.path().join("hyperliquid_perps_volume.csv");

    let err = persist_download(&captured(dir.path().join("no-such-guid")), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Io { .. }));
    assert!(!dest.exists());
    assert!(!partial_path(&dest).exists());
}

#[tokio::test]
async fn test_rerun_overwrites_previous_export() {
    let dir = create_test_dir().unwrap();
    let dest = dir.path().join("data/hyperliquid_perps_volume.csv");

    let first = dir.path().join("guid-1");
    std::fs::write(&first, "date,volume\n").unwrap();
    persist_download(&captured(first), &dest).await.unwrap();

    let second = dir.path().join("guid-2");
    std::fs::write(&second, SAMPLE_CSV).unwrap();
    let saved = persist_download(&captured(second), &dest).await.unwrap();

    assert_eq!(saved.byte_size, SAMPLE_CSV.len() as u64);
    assert_eq!(saved.suggested_filename, None);
    assert!(saved.source_url.is_some());
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), SAMPLE_CSV);
}
