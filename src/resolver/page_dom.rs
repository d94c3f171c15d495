//! Live page surface backed by CDP `Runtime.evaluate`

use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use super::ResolvedControl;
use super::dom::{DomSurface, NodeInfo};
use crate::error::{FetchError, FetchResult};

/// Attribute used to hand a resolved element from JS back to CDP
const TARGET_ATTRIBUTE: &str = "data-hl-perps-target";

/// Collects [`NodeInfo`] for every match of `__SELECTOR__`
///
/// Parent indices point at the nearest ancestor that is also in the list.
const SNAPSHOT_SCRIPT: &str = r#"
    (() => {
        const els = Array.from(document.querySelectorAll(__SELECTOR__));
        const index = new Map(els.map((el, i) => [el, i]));
        const norm = s => (s || '').replace(/\s+/g, ' ').trim();
        const implicitRole = el => {
            const tag = el.tagName.toLowerCase();
            if (tag === 'button' || tag === 'summary') return 'button';
            if ((tag === 'a' || tag === 'area') && el.hasAttribute('href')) return 'link';
            if (tag === 'input') {
                const t = (el.getAttribute('type') || 'text').toLowerCase();
                if (['button', 'submit', 'reset', 'image'].includes(t)) return 'button';
                if (t === 'checkbox' || t === 'radio') return t;
                if (t === 'hidden') return null;
                return 'textbox';
            }
            if (tag === 'select') return 'combobox';
            if (tag === 'option') return 'option';
            if (tag === 'li') return 'listitem';
            return null;
        };
        const isVisible = el => {
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden') return false;
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        };
        return els.map(el => {
            const text = norm(el.innerText !== undefined ? el.innerText : el.textContent);
            const name = norm(el.getAttribute('aria-label'))
                || text
                || norm(el.value)
                || norm(el.getAttribute('title'));
            let parent = null;
            for (let p = el.parentElement; p; p = p.parentElement) {
                if (index.has(p)) { parent = index.get(p); break; }
            }
            return {
                tag: el.tagName.toLowerCase(),
                role: el.getAttribute('role') || implicitRole(el),
                name,
                text,
                raw_text: norm(el.textContent),
                visible: isVisible(el),
                parent,
            };
        });
    })()
"#;

/// Tags the `index`-th match of `__SELECTOR__` with `__TOKEN__`
///
/// The element must still show `__TEXT__` (normalised like the snapshot),
/// otherwise the page re-rendered since the snapshot and nothing is tagged.
const MARK_SCRIPT: &str = r#"
    (() => {
        const norm = s => (s || '').replace(/\s+/g, ' ').trim();
        const els = document.querySelectorAll(__SELECTOR__);
        const el = els[__INDEX__];
        if (!el) return false;
        const text = norm(el.innerText !== undefined ? el.innerText : el.textContent);
        if (text !== __TEXT__) return false;
        el.setAttribute(__ATTRIBUTE__, __TOKEN__);
        return true;
    })()
"#;

fn mark_script(control: &ResolvedControl, token: &str) -> String {
    MARK_SCRIPT
        .replace("__SELECTOR__", &js_string(&control.selector))
        .replace("__INDEX__", &control.index.to_string())
        .replace("__TEXT__", &js_string(&control.text))
        .replace("__ATTRIBUTE__", &js_string(TARGET_ATTRIBUTE))
        .replace("__TOKEN__", &js_string(token))
}

/// Quote a string as a JS literal
fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub struct PageSurface<'a> {
    page: &'a Page,
}

impl<'a> PageSurface<'a> {
    #[must_use]
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }
}

impl DomSurface for PageSurface<'_> {
    async fn snapshot(&self, selector: &str) -> FetchResult<Vec<NodeInfo>> {
        let script = SNAPSHOT_SCRIPT.replace("__SELECTOR__", &js_string(selector));
        let result = self.page.evaluate(script.as_str()).await?;
        result
            .into_value::<Vec<NodeInfo>>()
            .map_err(|e| FetchError::Browser(format!("unexpected DOM snapshot shape: {e}")))
    }
}

/// CDP handle for a control found by a resolver
///
/// The element is tagged with a one-off attribute so that `find_element`
/// lands on exactly the node the strategy picked. `None` means the node at
/// that position is gone or no longer carries the resolved text; resolve
/// again before retrying.
pub async fn locate_control(
    page: &Page,
    control: &ResolvedControl,
) -> FetchResult<Option<Element>> {
    let token = format!("{:016x}", rand::random::<u64>());
    let marked: bool = page
        .evaluate(mark_script(control, &token).as_str())
        .await?
        .into_value()
        .map_err(|e| FetchError::Browser(format!("unexpected mark result: {e}")))?;
    if !marked {
        return Ok(None);
    }

    let element = page
        .find_element(format!("[{TARGET_ATTRIBUTE}=\"{token}\"]"))
        .await?;
    Ok(Some(element))
}
