//! Type-safe builder for `FetchConfig` using the typestate pattern
//!
//! The output directory is the only required field; `build()` is available
//! once it has been set.

use anyhow::{Result, anyhow, bail};
use std::collections::HashSet;
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::FetchConfig;
use crate::retry::Backoff;
use crate::target::FetchTarget;
use crate::utils::{
    DEFAULT_CONTROL_TIMEOUT_SECS, DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_OPEN_INTEREST_PAGE_URL, DEFAULT_SETTLE_DELAY_MS,
    DEFAULT_STRATEGY_TIMEOUT_SECS, DEFAULT_TOGGLE_TIMEOUT_SECS, DEFAULT_VOLUME_PAGE_URL,
};

// Type states for the builder
pub struct WithOutputDir;

/// Settings shared by every builder state
#[derive(Debug, Clone)]
pub(crate) struct BuilderFields {
    pub(crate) volume_page_url: String,
    pub(crate) open_interest_page_url: String,
    pub(crate) volume_output: Option<PathBuf>,
    pub(crate) open_interest_output: Option<PathBuf>,
    pub(crate) targets: Option<Vec<FetchTarget>>,
    pub(crate) headless: bool,
    pub(crate) fetch_timeout_secs: u64,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) control_timeout_secs: u64,
    pub(crate) strategy_timeout_secs: u64,
    pub(crate) toggle_timeout_secs: u64,
    pub(crate) settle_delay_ms: u64,
    pub(crate) max_attempts: u32,
    pub(crate) backoff: Backoff,
    pub(crate) run_deadline_secs: Option<u64>,
    pub(crate) debug_snapshot_dir: Option<PathBuf>,
    pub(crate) chrome_executable: Option<PathBuf>,
}

impl Default for BuilderFields {
    fn default() -> Self {
        Self {
            volume_page_url: DEFAULT_VOLUME_PAGE_URL.to_string(),
            open_interest_page_url: DEFAULT_OPEN_INTEREST_PAGE_URL.to_string(),
            volume_output: None,
            open_interest_output: None,
            targets: None,
            headless: true,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            control_timeout_secs: DEFAULT_CONTROL_TIMEOUT_SECS,
            strategy_timeout_secs: DEFAULT_STRATEGY_TIMEOUT_SECS,
            toggle_timeout_secs: DEFAULT_TOGGLE_TIMEOUT_SECS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
            run_deadline_secs: None,
            debug_snapshot_dir: None,
            chrome_executable: None,
        }
    }
}

pub struct FetchConfigBuilder<State = ()> {
    pub(crate) output_dir: Option<PathBuf>,
    pub(crate) fields: BuilderFields,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for FetchConfigBuilder<()> {
    fn default() -> Self {
        Self {
            output_dir: None,
            fields: BuilderFields::default(),
            _phantom: PhantomData,
        }
    }
}

impl FetchConfig {
    /// Create a builder for configuring a `FetchConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> FetchConfigBuilder<()> {
        FetchConfigBuilder::default()
    }
}

impl FetchConfigBuilder<()> {
    pub fn output_dir(self, dir: impl Into<PathBuf>) -> FetchConfigBuilder<WithOutputDir> {
        FetchConfigBuilder {
            output_dir: Some(dir.into()),
            fields: self.fields,
            _phantom: PhantomData,
        }
    }
}

fn validate_page_url(url: &str) -> Result<()> {
    let parsed = Url::parse(url).map_err(|e| anyhow!("Invalid page URL '{url}': {e}"))?;
    match parsed.scheme() {
        "http" | "https" | "file" => Ok(()),
        other => bail!("Unsupported URL scheme '{other}' in '{url}'"),
    }
}

fn require_positive(name: &str, value: u64) -> Result<()> {
    if value == 0 {
        bail!("{name} must be greater than zero");
    }
    Ok(())
}

// Build method only available when all required fields are set
impl FetchConfigBuilder<WithOutputDir> {
    pub fn build(self) -> Result<FetchConfig> {
        let fields = self.fields;
        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("output_dir is required"))?;
        let output_dir = std::path::absolute(&output_dir)
            .map_err(|e| anyhow!("Cannot resolve output dir {}: {e}", output_dir.display()))?;

        require_positive("fetch_timeout_secs", fields.fetch_timeout_secs)?;
        require_positive("navigation_timeout_secs", fields.navigation_timeout_secs)?;
        require_positive("control_timeout_secs", fields.control_timeout_secs)?;
        require_positive("strategy_timeout_secs", fields.strategy_timeout_secs)?;
        if fields.max_attempts == 0 {
            bail!("max_attempts must be at least 1");
        }
        if let Some(deadline) = fields.run_deadline_secs {
            require_positive("run_deadline_secs", deadline)?;
        }

        let targets = match fields.targets {
            Some(targets) => targets,
            None => {
                let mut volume = FetchTarget::volume(&output_dir);
                volume.page_url = fields.volume_page_url;
                if let Some(path) = fields.volume_output {
                    volume.output_path = path;
                }
                let mut open_interest = FetchTarget::open_interest(&output_dir);
                open_interest.page_url = fields.open_interest_page_url;
                if let Some(path) = fields.open_interest_output {
                    open_interest.output_path = path;
                }
                vec![volume, open_interest]
            }
        };

        if targets.is_empty() {
            bail!("at least one fetch target is required");
        }
        let mut seen = HashSet::new();
        for target in &targets {
            validate_page_url(&target.page_url)?;
            if target.download_button_label.trim().is_empty() {
                bail!("target '{}' has an empty download label", target.name);
            }
            if target.output_path.file_name().is_none() {
                bail!(
                    "target '{}' output path {} does not name a file",
                    target.name,
                    target.output_path.display()
                );
            }
            // Two targets writing the same file would clobber each other
            if !seen.insert(target.output_path.clone()) {
                bail!(
                    "output path {} is used by more than one target",
                    target.output_path.display()
                );
            }
        }


        Ok(FetchConfig {
            output_dir,
            targets,
            headless: fields.headless,
            fetch_timeout_secs: fields.fetch_timeout_secs,
            navigation_timeout_secs: fields.navigation_timeout_secs,
            control_timeout_secs: fields.control_timeout_secs,
            strategy_timeout_secs: fields.strategy_timeout_secs,
            toggle_timeout_secs: fields.toggle_timeout_secs,
            settle_delay_ms: fields.settle_delay_ms,
            max_attempts: fields.max_attempts,
            backoff: fields.backoff,
            run_deadline_secs: fields.run_deadline_secs,
            debug_snapshot_dir: fields.debug_snapshot_dir,
            chrome_executable: fields.chrome_executable,
        })
    }
}
