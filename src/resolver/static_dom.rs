//! Static HTML surface
//!
//! Resolves controls in an HTML document without a browser. There is no
//! layout engine behind it, so visibility only honours the `hidden`
//! attribute and inline `display: none` / `visibility: hidden` styles.

use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::future::Future;

use super::dom::{DomSurface, NodeInfo, implicit_role, normalize_text};
use crate::error::{FetchError, FetchResult};

/// Tags whose text never renders
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "template", "noscript", "head"];

/// Inline tags; text on either side joins without a space
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "code", "em", "i", "kbd", "small", "span", "strong", "sub", "sup", "u",
];

#[derive(Debug, Clone)]
pub struct StaticDom {
    html: String,
}

impl StaticDom {
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }

    fn collect(&self, selector: &str) -> FetchResult<Vec<NodeInfo>> {
        let selector = Selector::parse(selector)
            .map_err(|e| FetchError::Config(format!("invalid selector '{selector}': {e}")))?;
        let document = Html::parse_document(&self.html);

        let elements: Vec<ElementRef<'_>> = document.select(&selector).collect();
        let positions: HashMap<_, usize> = elements
            .iter()
            .enumerate()
            .map(|(i, el)| (el.id(), i))
            .collect();

        let nodes = elements
            .iter()
            .map(|el| {
                let value = el.value();
                let tag = value.name().to_ascii_lowercase();

                let mut raw = String::new();
                rendered_text(*el, &mut raw);
                let text = normalize_text(&raw);
                let raw_text = normalize_text(&el.text().collect::<String>());

                let role = value.attr("role").map(str::to_string).or_else(|| {
                    implicit_role(&tag, value.attr("type"), value.attr("href").is_some())
                        .map(str::to_string)
                });

                let name = [
                    value.attr("aria-label").map(normalize_text),
                    Some(text.clone()),
                    value.attr("value").map(normalize_text),
                    value.attr("title").map(normalize_text),
                ]
                .into_iter()
                .flatten()
                .find(|s| !s.is_empty())
                .unwrap_or_default();

                let visible = !is_hidden(value)
                    && !el
                        .ancestors()
                        .filter_map(|n| n.value().as_element())
                        .any(is_hidden);

                let parent = el
                    .ancestors()
                    .find_map(|n| positions.get(&n.id()).copied());

                NodeInfo {
                    tag,
                    role,
                    name,
                    text,
                    raw_text,
                    visible,
                    parent,
                }
            })
            .collect();

        Ok(nodes)
    }
}

impl DomSurface for StaticDom {
    fn snapshot(&self, selector: &str) -> impl Future<Output = FetchResult<Vec<NodeInfo>>> + Send {
        // scraper's tree is not Send; parse eagerly and hand back a ready value
        std::future::ready(self.collect(selector))
    }
}

fn is_hidden(element: &Element) -> bool {
    if NON_RENDERED_TAGS.contains(&element.name()) || element.attr("hidden").is_some() {
        return true;
    }
    element.attr("style").is_some_and(|style| {
        let compact: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        compact.contains("display:none") || compact.contains("visibility:hidden")
    })
}

/// Text of `el` that would render, skipping hidden subtrees
fn rendered_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                if is_hidden(element) {
                    continue;
                }
                let Some(child_ref) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = !INLINE_TAGS.contains(&element.name());
                if block {
                    out.push(' ');
                }
                rendered_text(child_ref, out);
                if block {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="chart">
            <div class="toolbar">
              <button aria-label="Export data">Download <span>.csv</span></button>
              <button style="display: none">Download .csv</button>
            </div>
            <p hidden>Download .csv</p>
            <a href="/x">Docs</a>
          </div>
        </body></html>
    "#;

    #[tokio::test]
    async fn snapshot_reports_roles_names_and_visibility() {
        let dom = StaticDom::new(PAGE);
        let nodes = dom.snapshot("button").await.unwrap();
        assert_eq!(nodes.len(), 2);

        assert_eq!(nodes[0].role.as_deref(), Some("button"));
        assert_eq!(nodes[0].name, "Export data");
        assert_eq!(nodes[0].text, "Download .csv");
        assert!(nodes[0].visible);

        assert!(!nodes[1].visible);
    }

    #[tokio::test]
    async fn raw_text_keeps_hidden_descendants() {
        let dom = StaticDom::new(
            r#"<body><button>
                 <span style="display:none">Download .csv</span><i>icon</i>
               </button></body>"#,
        );
        let nodes = dom.snapshot("button").await.unwrap();
        assert_eq!(nodes[0].text, "icon");
        assert_eq!(nodes[0].raw_text, "Download .csvicon");
    }

    #[tokio::test]
    async fn hidden_ancestor_hides_descendants() {
        let dom = StaticDom::new(r#"<body><div style="visibility:hidden"><b>x</b></div></body>"#);
        let nodes = dom.snapshot("b").await.unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(!nodes[0].visible);
    }

    #[tokio::test]
    async fn parents_point_at_nearest_selected_ancestor() {
        let dom = StaticDom::new(PAGE);
        let nodes = dom.snapshot("body *").await.unwrap();
        let button = nodes
            .iter()
            .position(|n| n.tag == "button")
            .expect("button present");
        let toolbar = nodes[button].parent.expect("button has a parent");
        assert_eq!(nodes[toolbar].tag, "div");
        let span = nodes.iter().position(|n| n.tag == "span").unwrap();
        assert_eq!(nodes[span].parent, Some(button));
    }

    #[tokio::test]
    async fn invalid_selector_is_a_config_error() {
        let dom = StaticDom::new(PAGE);
        let err = dom.snapshot("button[").await.unwrap_err();
        assert!(matches!(err, FetchError::Config(_)));
    }
}
