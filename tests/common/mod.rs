//! Test utilities and helper functions for the fetcher test suite

use anyhow::Result;
use hl_perps_csv_fetch::{DownloadResult, FetchError, FetchResult, FetchTarget, TargetFetcher};
use mockito::{Mock, Server};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// CSV body served by the mock dashboards
#[allow(dead_code)]
pub const SAMPLE_CSV: &str = "date,volume\n2024-01-01,123.45\n2024-01-02,678.90\n";

/// Creates a temporary directory for test output
#[allow(dead_code)]
pub fn create_test_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Wraps `body` in a minimal HTML document
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// Dashboard-like page: granularity tabs, a chart and an export button
///
/// Clicking the button downloads `SAMPLE_CSV` through a `data:` URL, the
/// same way the real dashboards hand over a client-side generated file.
#[allow(dead_code)]
pub fn create_dashboard_html(with_toggle: bool) -> String {
    let toggle = if with_toggle {
        r#"<div role="tablist">
            <button role="tab">D</button>
            <button role="tab">W</button>
            <button role="tab">M</button>
        </div>"#
    } else {
        ""
    };
    let body = format!(
        r#"<main>
        <section class="chart">
            <h2>Perps Volume</h2>
            {toggle}
            <div class="toolbar">
                <button id="export" type="button">Download .csv</button>
            </div>
            <canvas width="600" height="300"></canvas>
        </section>
    </main>
    <script>
        document.getElementById('export').addEventListener('click', () => {{
            const a = document.createElement('a');
            a.href = 'data:text/csv;charset=utf-8,' + encodeURIComponent({csv});
            a.download = 'perps.csv';
            document.body.appendChild(a);
            a.click();
            a.remove();
        }});
    </script>"#,
        csv = serde_json::to_string(SAMPLE_CSV).unwrap_or_default()
    );
    create_test_html("Perps Volume", &body)
}

/// Dashboard whose export button is rendered but does nothing when clicked
#[allow(dead_code)]
pub fn create_dashboard_without_handler() -> String {
    create_test_html(
        "Perps Volume",
        r#"<main>
        <section class="chart">
            <h2>Perps Volume</h2>
            <div class="toolbar">
                <button id="export" type="button">Download .csv</button>
            </div>
        </section>
    </main>"#,
    )
}

/// Dashboard page without any export control
#[allow(dead_code)]
pub fn create_page_without_export() -> String {
    create_test_html(
        "Perps Volume",
        r#"<main><h2>Perps Volume</h2><p>Chart unavailable</p></main>"#,
    )
}

/// Sets up a mock HTTP server
#[allow(dead_code)]
pub async fn setup_mock_server() -> Result<mockito::ServerGuard> {
    let server = Server::new_async().await;
    Ok(server)
}

/// Creates a mock endpoint that returns HTML content
#[allow(dead_code)]
pub fn create_html_mock(server: &mut Server, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create()
}

/// Helper to create test URLs
#[allow(dead_code)]
pub fn test_url(server: &Server, path: &str) -> String {
    format!("{}{}", server.url(), path)
}

/// Target pointing at a page on the mock server, writing under `dir`
#[allow(dead_code)]
pub fn test_target(name: &str, url: &str, dir: &Path) -> FetchTarget {
    FetchTarget::new(name, url, dir.join(format!("{name}.csv")))
}

/// Verifies that a file exists and has content
#[allow(dead_code)]
pub async fn assert_file_exists_with_content(path: &Path) -> Result<String> {
    assert!(path.exists(), "File does not exist: {path:?}");
    let content = tokio::fs::read_to_string(path).await?;
    assert!(!content.is_empty(), "File is empty: {path:?}");
    Ok(content)
}

/// What a scripted fetch attempt does
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Step {
    /// Write this body to the target's output path
    Write(&'static str),
    /// Fail with a control-not-found error
    Fail,
}

/// `TargetFetcher` that follows a per-target script instead of a browser
///
/// Once a target's script is used up its last step repeats.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct ScriptedFetcher {
    scripts: HashMap<String, Vec<Step>>,
    calls: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, target: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(target.to_string(), steps);
        self
    }

    /// Target names in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, target: &str) -> usize {
        self.calls().iter().filter(|c| *c == target).count()
    }

    fn next_step(&self, target: &str) -> Step {
        let mut calls = self.calls.lock().unwrap();
        let previous = calls.iter().filter(|c| *c == target).count();
        calls.push(target.to_string());

        let script = self.scripts.get(target).cloned().unwrap_or_default();
        script
            .get(previous)
            .or_else(|| script.last())
            .cloned()
            .unwrap_or(Step::Fail)
    }
}

impl TargetFetcher for ScriptedFetcher {
    async fn fetch(&self, target: &FetchTarget) -> FetchResult<DownloadResult> {
        match self.next_step(&target.name) {
            Step::Write(body) => {
                tokio::fs::write(&target.output_path, body)
                    .await
                    .map_err(|e| FetchError::io(&target.output_path, e))?;
                Ok(DownloadResult {
                    output_path: target.output_path.clone(),
                    byte_size: body.len() as u64,
                    timestamp: chrono::Utc::now(),
                    source_url: None,
                    suggested_filename: None,
                })
            }
            Step::Fail => Err(FetchError::ControlNotFound {
                control: target.download_button_label.clone(),
                tried: vec!["role+name".into(), "text-pattern".into()],
                timeout: std::time::Duration::from_millis(1),
            }),
        }
    }
}
