//! Control resolution on client-rendered pages
//!
//! Dashboards render their widgets after the load event and do not promise
//! a stable DOM, so a control is located by trying an ordered list of
//! strategies. Each strategy polls the page for up to its own timeout; the
//! first one that finds a visible match wins. Rounds repeat until the overall
//! budget is spent.

mod dom;
mod page_dom;
mod static_dom;
mod strategy;

pub use dom::{DomSurface, NodeInfo, implicit_role, innermost_match, normalize_text};
pub use page_dom::{PageSurface, locate_control};
pub use static_dom::StaticDom;
pub use strategy::{
    ContainsTextStrategy, ExactTextStrategy, ResolveStrategy, RoleNameStrategy,
    TextPatternStrategy, label_pattern,
};

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{FetchError, FetchResult};
use crate::utils::constants::{CONTROL_POLL_INTERVAL_MS, DEFAULT_STRATEGY_TIMEOUT_SECS};

/// A control found on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedControl {
    /// Strategy that found it
    pub strategy: &'static str,
    /// Selector the strategy queried
    pub selector: String,
    /// Position of the element among the selector's matches
    pub index: usize,
    /// Visible text of the element
    pub text: String,
}

/// Ordered list of strategies for one control
#[derive(Debug)]
pub struct ControlResolver {
    control: String,
    strategies: Vec<Box<dyn ResolveStrategy>>,
    strategy_timeout: Duration,
    poll_interval: Duration,
}

impl ControlResolver {
    /// Empty resolver; add strategies with [`with_strategy`](Self::with_strategy)
    #[must_use]
    pub fn new(control: impl Into<String>) -> Self {
        Self {
            control: control.into(),
            strategies: Vec::new(),
            strategy_timeout: Duration::from_secs(DEFAULT_STRATEGY_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(CONTROL_POLL_INTERVAL_MS),
        }
    }

    /// Append a strategy; earlier strategies take priority
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl ResolveStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    #[must_use]
    pub fn strategy_timeout(mut self, timeout: Duration) -> Self {
        self.strategy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Resolver for an export control labelled like `label`
    ///
    /// Priority: a `button` whose accessible name matches, any element whose
    /// visible text matches, a clickable element whose full text content
    /// (hidden parts included) contains the label.
    pub fn download_control(label: &str) -> FetchResult<Self> {
        let pattern = label_pattern(label)
            .map_err(|e| FetchError::Config(format!("invalid download label '{label}': {e}")))?;
        Ok(Self::new(label)
            .with_strategy(RoleNameStrategy::new("button", pattern.clone()))
            .with_strategy(TextPatternStrategy::new(pattern))
            .with_strategy(ContainsTextStrategy::new(label.trim())))
    }

    /// Resolver for a control whose whole visible text is exactly `label`
    #[must_use]
    pub fn exact_label(label: &str) -> Self {
        Self::new(label).with_strategy(ExactTextStrategy::new(label))
    }

    #[must_use]
    pub fn control(&self) -> &str {
        &self.control
    }

    #[must_use]
    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name().to_string()).collect()
    }

    /// Find the control or fail with `ControlNotFound` once `budget` is spent
    pub async fn resolve<S>(&self, surface: &S, budget: Duration) -> FetchResult<ResolvedControl>
    where
        S: DomSurface + Sync,
    {
        match self.try_resolve(surface, budget).await {
            Some(control) => Ok(control),
            None => Err(FetchError::ControlNotFound {
                control: self.control.clone(),
                tried: self.strategy_names(),
                timeout: budget,
            }),
        }
    }

    /// Find the control, or `None` once `budget` is spent
    ///
    /// Every strategy gets at least one look even with a zero budget.
    pub async fn try_resolve<S>(&self, surface: &S, budget: Duration) -> Option<ResolvedControl>
    where
        S: DomSurface + Sync,
    {
        let overall = Instant::now() + budget;
        let mut round = 0u32;

        loop {
            for strategy in &self.strategies {
                let now = Instant::now();
                if round > 0 && now >= overall {
                    break;
                }
                let deadline = (now + self.strategy_timeout).min(overall);
                if let Some(found) = self
                    .poll_strategy(surface, strategy.as_ref(), deadline)
                    .await
                {
                    info!(
                        control = %self.control,
                        strategy = found.strategy,
                        index = found.index,
                        "Resolved control"
                    );
                    return Some(found);
                }
            }

            round += 1;
            if Instant::now() >= overall || self.strategies.is_empty() {
                debug!(control = %self.control, rounds = round, "Control not found within budget");
                return None;
            }
        }
    }

    async fn poll_strategy<S>(
        &self,
        surface: &S,
        strategy: &dyn ResolveStrategy,
        deadline: Instant,
    ) -> Option<ResolvedControl>
    where
        S: DomSurface + Sync,
    {
        loop {
            match surface.snapshot(strategy.selector()).await {
                Ok(nodes) => {
                    if let Some(index) = strategy.pick(&nodes) {
                        return Some(ResolvedControl {
                            strategy: strategy.name(),
                            selector: strategy.selector().to_string(),
                            index,
                            text: nodes[index].text.clone(),
                        });
                    }
                }
                // The page may be mid-render or mid-navigation; keep polling
                Err(e) => debug!(strategy = strategy.name(), "Snapshot failed: {e}"),
            }

            if Instant::now() + self.poll_interval > deadline {
                return None;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
