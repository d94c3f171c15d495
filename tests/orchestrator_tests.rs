//! Orchestrator runs against scripted fetchers

use hl_perps_csv_fetch::{Backoff, FetchConfig, Orchestrator, RetryPolicy, RunError};
use std::time::Duration;

mod common;

use common::{SAMPLE_CSV, ScriptedFetcher, Step, create_test_dir, test_target};

fn quick_policy() -> RetryPolicy {
    RetryPolicy::new(3, Backoff::fixed(Duration::from_millis(1)))
}

#[tokio::test]
async fn test_one_target_fails_other_still_written() {
    let dir = create_test_dir().unwrap();
    let volume = test_target("volume", "https://example.com/volume", dir.path());
    let oi = test_target("open_interest", "https://example.com/oi", dir.path());

    let fetcher = ScriptedFetcher::new()
        .script("volume", vec![Step::Write(SAMPLE_CSV)])
        .script("open_interest", vec![Step::Fail]);
    let orchestrator = Orchestrator::new(fetcher, vec![volume.clone(), oi.clone()], quick_policy());

    let report = orchestrator.run().await;

    assert!(!report.is_success());
    assert_eq!(report.failed(), vec!["open_interest"]);
    assert_eq!(report.outcomes[0].attempts(), 1);
    assert_eq!(report.outcomes[1].attempts(), 3);

    let content = common::assert_file_exists_with_content(&volume.output_path)
        .await
        .unwrap();
    assert_eq!(content, SAMPLE_CSV);
    assert!(!oi.output_path.exists());

    match report.into_result() {
        Err(RunError::TargetsFailed { failed, total }) => {
            assert_eq!(failed, vec!["open_interest".to_string()]);
            assert_eq!(total, 2);
        }
        other => panic!("expected TargetsFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_targets_run_in_order_and_failure_does_not_stop_the_run() {
    let dir = create_test_dir().unwrap();
    let first = test_target("first", "https://example.com/1", dir.path());
    let second = test_target("second", "https://example.com/2", dir.path());

    let fetcher = ScriptedFetcher::new()
        .script("first", vec![Step::Fail])
        .script("second", vec![Step::Write("a,b\n1,2\n")]);
    let orchestrator = Orchestrator::new(fetcher, vec![first, second.clone()], quick_policy());

    let report = orchestrator.run().await;
    assert_eq!(report.failed(), vec!["first"]);
    assert!(second.output_path.exists());
}

#[tokio::test]
async fn test_flaky_target_recovers_within_budget() {
    let dir = create_test_dir().unwrap();
    let volume = test_target("volume", "https://example.com/volume", dir.path());

    let fetcher = ScriptedFetcher::new().script(
        "volume",
        vec![Step::Fail, Step::Fail, Step::Write(SAMPLE_CSV)],
    );
    let orchestrator = Orchestrator::new(fetcher, vec![volume.clone()], quick_policy());

    let report = orchestrator.run().await;
    assert!(report.is_success());

    let done = report.outcomes[0].result.as_ref().unwrap();
    assert_eq!(done.attempts, 3);
    assert_eq!(done.failures.len(), 2);

    let saved = report.into_result().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].output_path, volume.output_path);
}

#[tokio::test]
async fn test_from_config_uses_configured_targets_and_policy() {
    let dir = create_test_dir().unwrap();
    let config = FetchConfig::builder()
        .output_dir(dir.path())
        .max_attempts(2)
        .backoff(Backoff::fixed(Duration::ZERO))
        .build()
        .unwrap();

    let fetcher = ScriptedFetcher::new()
        .script("volume", vec![Step::Write(SAMPLE_CSV)])
        .script("open_interest", vec![Step::Write(SAMPLE_CSV)]);
    let orchestrator = Orchestrator::from_config(fetcher, &config);
    assert_eq!(orchestrator.targets().len(), 2);

    let saved = orchestrator.run().await.into_result().unwrap();
    assert_eq!(saved.len(), 2);
    assert!(dir.path().join("hyperliquid_perps_volume.csv").exists());
    assert!(dir.path().join("hyperliquid_perps_open_interest.csv").exists());
}

#[tokio::test]
async fn test_exhausted_target_uses_every_attempt() {
    let dir = create_test_dir().unwrap();
    let volume = test_target("volume", "https://example.com/volume", dir.path());

    let fetcher = ScriptedFetcher::new().script("volume", vec![Step::Fail]);
    let orchestrator = Orchestrator::new(fetcher, vec![volume], quick_policy());

    let report = orchestrator.run().await;
    let exhausted = report.outcomes[0].result.as_ref().unwrap_err();
    assert_eq!(exhausted.attempts, 3);
    assert_eq!(exhausted.failures.len(), 3);
}

#[tokio::test]
async fn test_run_deadline_is_enforced() {
    let dir = create_test_dir().unwrap();
    let volume = test_target("volume", "https://example.com/volume", dir.path());

    // Long backoff between failures keeps the run busy past the deadline
    let fetcher = ScriptedFetcher::new().script("volume", vec![Step::Fail]);
    let policy = RetryPolicy::new(3, Backoff::fixed(Duration::from_secs(5)));
    let orchestrator = Orchestrator::new(fetcher, vec![volume], policy);

    let err = orchestrator
        .run_with_deadline(Some(Duration::from_millis(50)))
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::DeadlineExceeded { .. }));
}
