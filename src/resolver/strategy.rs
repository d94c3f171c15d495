//! Control resolution strategies
//!
//! Each strategy names a CSS selector for its candidate set and a predicate
//! over [`NodeInfo`]. Hidden elements never match.

use regex::Regex;
use std::fmt;

use super::dom::{NodeInfo, innermost_match};

/// One way of finding a control on the page
pub trait ResolveStrategy: Send + Sync + fmt::Debug {
    /// Short description used in logs and `ControlNotFound` errors
    fn name(&self) -> &'static str;

    /// CSS selector for the candidate elements
    fn selector(&self) -> &str;

    fn matches(&self, node: &NodeInfo) -> bool;

    /// Index of the element to use among `nodes`
    fn pick(&self, nodes: &[NodeInfo]) -> Option<usize> {
        innermost_match(nodes, |n| n.visible && self.matches(n))
    }
}

/// Case-insensitive pattern for a visible label, whitespace optional
///
/// `"Download .csv"` becomes `(?i)Download\s*\.csv`.
pub fn label_pattern(label: &str) -> Result<Regex, regex::Error> {
    let body = label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s*");
    Regex::new(&format!("(?i){body}"))
}

/// Interactive control with the given role whose accessible name matches
#[derive(Debug, Clone)]
pub struct RoleNameStrategy {
    role: String,
    name: Regex,
}

impl RoleNameStrategy {
    pub const SELECTOR: &'static str = "button, a[href], input, summary, [role]";

    #[must_use]
    pub fn new(role: impl Into<String>, name: Regex) -> Self {
        Self {
            role: role.into(),
            name,
        }
    }
}

impl ResolveStrategy for RoleNameStrategy {
    fn name(&self) -> &'static str {
        "role+name"
    }

    fn selector(&self) -> &str {
        Self::SELECTOR
    }

    fn matches(&self, node: &NodeInfo) -> bool {
        node.role.as_deref() == Some(self.role.as_str()) && self.name.is_match(&node.name)
    }
}

/// Any element whose visible text matches a pattern
#[derive(Debug, Clone)]
pub struct TextPatternStrategy {
    pattern: Regex,
}

impl TextPatternStrategy {
    pub const SELECTOR: &'static str = "body *";

    #[must_use]
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }
}

impl ResolveStrategy for TextPatternStrategy {
    fn name(&self) -> &'static str {
        "text-pattern"
    }

    fn selector(&self) -> &str {
        Self::SELECTOR
    }

    fn matches(&self, node: &NodeInfo) -> bool {
        self.pattern.is_match(&node.text)
    }
}

/// A visible clickable element whose full `textContent` contains a literal
///
/// Catches controls whose label is visually hidden (screen-reader text next
/// to an icon) or split across nodes, which the visible-text strategies
/// miss. Case and whitespace are ignored. Only clickable elements are
/// candidates so a visible container never stands in for a hidden control.
#[derive(Debug, Clone)]
pub struct ContainsTextStrategy {
    literal: String,
}

impl ContainsTextStrategy {
    pub const SELECTOR: &'static str = "button, a, summary, [role='button'], \
        [role='menuitem'], [role='link'], [onclick]";

    #[must_use]
    pub fn new(literal: &str) -> Self {
        Self {
            literal: compact(literal),
        }
    }
}

/// Lowercase with every whitespace character removed
fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

impl ResolveStrategy for ContainsTextStrategy {
    fn name(&self) -> &'static str {
        "contains-text"
    }

    fn selector(&self) -> &str {
        Self::SELECTOR
    }

    fn matches(&self, node: &NodeInfo) -> bool {
        !self.literal.is_empty() && compact(&node.raw_text).contains(&self.literal)
    }
}

/// A clickable-looking element whose whole visible text equals the label
///
/// Case-sensitive so a single-letter `D` never matches `Download` or `d`.
#[derive(Debug, Clone)]
pub struct ExactTextStrategy {
    label: String,
}

impl ExactTextStrategy {
    pub const SELECTOR: &'static str = "button, a, label, li, span, div, \
        [role='button'], [role='tab'], [role='radio'], [role='option']";

    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ResolveStrategy for ExactTextStrategy {
    fn name(&self) -> &'static str {
        "exact-text"
    }

    fn selector(&self) -> &str {
        Self::SELECTOR
    }

    fn matches(&self, node: &NodeInfo) -> bool {
        node.text == self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(tag: &str, role: Option<&str>, text: &str) -> NodeInfo {
        NodeInfo {
            tag: tag.into(),
            role: role.map(Into::into),
            name: text.into(),
            text: text.into(),
            raw_text: text.into(),
            visible: true,
            parent: None,
        }
    }

    #[test]
    fn label_pattern_is_case_and_space_insensitive() {
        let re = label_pattern("Download .csv").unwrap();
        assert!(re.is_match("Download .csv"));
        assert!(re.is_match("download.CSV"));
        assert!(re.is_match("DOWNLOAD   .csv"));
        assert!(!re.is_match("Download csv"));
        assert!(!re.is_match("Download xcsv"));
    }

    #[test]
    fn role_strategy_requires_role_and_name() {
        let s = RoleNameStrategy::new("button", label_pattern("Download .csv").unwrap());
        assert!(s.matches(&visible("button", Some("button"), "Download .csv")));
        assert!(!s.matches(&visible("a", Some("link"), "Download .csv")));
        assert!(!s.matches(&visible("button", Some("button"), "Export")));
    }

    #[test]
    fn hidden_nodes_are_never_picked() {
        let s = ContainsTextStrategy::new("Download .csv");
        let mut hidden = visible("span", None, "Download .csv");
        hidden.visible = false;
        assert_eq!(s.pick(&[hidden]), None);
    }

    #[test]
    fn contains_strategy_reads_hidden_label_text() {
        // <button><span class="sr-only">Download .csv</span><svg/></button>
        let mut button = visible("button", Some("button"), "");
        button.raw_text = "Download .csv".into();
        let mut label = visible("span", None, "");
        label.raw_text = "Download .csv".into();
        label.visible = false;
        label.parent = Some(0);
        let nodes = [button, label];

        let pattern = label_pattern("Download .csv").unwrap();
        assert_eq!(RoleNameStrategy::new("button", pattern.clone()).pick(&nodes), None);
        assert_eq!(TextPatternStrategy::new(pattern).pick(&nodes), None);
        assert_eq!(ContainsTextStrategy::new("Download .csv").pick(&nodes), Some(0));
    }

    #[test]
    fn contains_strategy_ignores_case_and_split_whitespace() {
        let s = ContainsTextStrategy::new("Download .csv");
        let mut split = visible("a", Some("link"), "");
        split.raw_text = "DOWNLOAD\n.CSV".into();
        assert!(s.matches(&split));
        assert!(!s.matches(&visible("a", Some("link"), "Download csv")));
        assert!(!ContainsTextStrategy::new("  ").matches(&split));
    }

    #[test]
    fn exact_text_is_case_sensitive_whole_text() {
        let s = ExactTextStrategy::new("D");
        assert!(s.matches(&visible("button", Some("button"), "D")));
        assert!(!s.matches(&visible("button", Some("button"), "d")));
        assert!(!s.matches(&visible("button", Some("button"), "Download .csv")));
        assert!(!s.matches(&visible("button", Some("button"), "W")));
    }
}
