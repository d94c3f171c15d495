//! DOM snapshot model shared by every surface
//!
//! A surface answers one question: "which elements match this CSS selector,
//! and what do they look like to a user?" Strategies only ever see
//! [`NodeInfo`] values, so the same matching code runs against a live page
//! and against static HTML.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::FetchResult;

/// What a user (or screen reader) sees of one element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Lowercase tag name
    pub tag: String,
    /// Explicit `role` attribute, else the implicit ARIA role of the tag
    pub role: Option<String>,
    /// Accessible name: `aria-label`, else visible text, else `value`/`title`
    pub name: String,
    /// Visible text with whitespace collapsed
    pub text: String,
    /// All descendant text (`textContent`), hidden parts included
    #[serde(default)]
    pub raw_text: String,
    pub visible: bool,
    /// Index of the nearest ancestor present in the same snapshot
    pub parent: Option<usize>,
}

/// Something that can be queried for element snapshots
pub trait DomSurface {
    /// Snapshot every element matching `selector`, in document order
    fn snapshot(&self, selector: &str) -> impl Future<Output = FetchResult<Vec<NodeInfo>>> + Send;
}

/// Collapse whitespace runs to single spaces and trim
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Implicit ARIA role for the handful of tags the strategies care about
#[must_use]
pub fn implicit_role(tag: &str, input_type: Option<&str>, has_href: bool) -> Option<&'static str> {
    match tag {
        "button" | "summary" => Some("button"),
        "a" | "area" if has_href => Some("link"),
        "input" => match input_type.unwrap_or("text").to_ascii_lowercase().as_str() {
            "button" | "submit" | "reset" | "image" => Some("button"),
            "checkbox" => Some("checkbox"),
            "radio" => Some("radio"),
            "hidden" => None,
            _ => Some("textbox"),
        },
        "select" => Some("combobox"),
        "option" => Some("option"),
        "li" => Some("listitem"),
        _ => None,
    }
}

/// First matching node, in document order, that has no matching descendant
///
/// Text-based matches hit every ancestor of the element that actually
/// carries the text; the innermost one is the element to click.
#[must_use]
pub fn innermost_match<F>(nodes: &[NodeInfo], matches: F) -> Option<usize>
where
    F: Fn(&NodeInfo) -> bool,
{
    let matched: Vec<bool> = nodes.iter().map(&matches).collect();
    let mut has_matching_descendant = vec![false; nodes.len()];

    for (i, node) in nodes.iter().enumerate() {
        if !matched[i] {
            continue;
        }
        let mut parent = node.parent;
        // Parent indices always point backwards; the bound guards malformed input
        let mut hops = 0;
        while let Some(p) = parent {
            if p >= nodes.len() || hops > nodes.len() {
                break;
            }
            has_matching_descendant[p] = true;
            parent = nodes[p].parent;
            hops += 1;
        }
    }

    (0..nodes.len()).find(|&i| matched[i] && !has_matching_descendant[i])
}
