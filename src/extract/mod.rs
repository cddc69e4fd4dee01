//! Link extraction for a single page
//!
//! Given one page's HTML and the compiled rule set, this module returns the
//! internal links that page carries:
//! - CSS rules select anchors directly, or containers whose anchors count
//! - Shortcode rules scan the raw text for `[name url="..."]`
//! - With no enabled rule, every `<a href>` counts
//!
//! Every candidate href is resolved against the page URL, dropped if it is
//! malformed or points to another site, and deduplicated by page identity
//! (first occurrence wins).

mod rule;
mod shortcode;

pub use rule::{is_shortcode_pattern, CompiledRule, RuleKind, RuleSet};
pub use shortcode::ShortcodePattern;

use crate::url::{canonical_key, resolve, same_host, NormalizedKey};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// A directed link found on one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// The page the link was found on
    pub source_url: String,

    /// The resolved absolute link target
    pub target_url: String,

    /// Trimmed anchor text, or `[name]` for shortcode links
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
}

/// Collects edges for one page, enforcing the domain filter and dedup
struct PageLinks<'a> {
    source_url: &'a str,
    source: Option<Url>,
    seen: HashSet<NormalizedKey>,
    edges: Vec<Edge>,
}

impl<'a> PageLinks<'a> {
    fn new(source_url: &'a str) -> Self {
        Self {
            source_url,
            source: Url::parse(source_url.trim()).ok(),
            seen: HashSet::new(),
            edges: Vec::new(),
        }
    }

    fn add(&mut self, href: &str, anchor_text: Option<String>) {
        let Some(source) = &self.source else {
            return;
        };

        let Some(target) = resolve(href, self.source_url) else {
            return;
        };

        if !same_host(source, &target) {
            return;
        }

        if self.seen.insert(canonical_key(target.as_str())) {
            self.edges.push(Edge {
                source_url: self.source_url.to_string(),
                target_url: target.to_string(),
                anchor_text,
            });
        }
    }

    fn add_anchor(&mut self, anchor: ElementRef<'_>) {
        if let Some(href) = anchor.value().attr("href") {
            self.add(href, anchor_text(anchor));
        }
    }
}

/// Extracts the internal links of one page
///
/// # Arguments
///
/// * `html` - The page body
/// * `source_url` - The page URL; relative hrefs are resolved against it
/// * `rules` - The compiled rule set
///
/// # Returns
///
/// At most one edge per distinct target identity, in discovery order.
/// Rules are applied in configuration order, so an earlier rule's anchor text
/// wins for a target several rules find.
///
/// # Example
///
/// ```
/// use link_matrix::extract::{extract, RuleSet};
///
/// let html = r#"<a href="/b">B</a><a href="https://ex.com/b">B2</a><a href="https://outside.com">out</a>"#;
/// let edges = extract(html, "https://ex.com/a", &RuleSet::all_links());
/// assert_eq!(edges.len(), 1);
/// assert_eq!(edges[0].target_url, "https://ex.com/b");
/// assert_eq!(edges[0].anchor_text.as_deref(), Some("B"));
/// ```
pub fn extract(html: &str, source_url: &str, rules: &RuleSet) -> Vec<Edge> {
    let mut page = PageLinks::new(source_url);
    if page.source.is_none() {
        return page.edges;
    }

    let needs_document = rules.is_fallback()
        || rules
            .rules()
            .iter()
            .any(|rule| matches!(rule.kind, RuleKind::Structural(_)));
    let document = needs_document.then(|| Html::parse_document(html));
    let anchors = anchor_selector();

    if rules.is_fallback() {
        if let (Some(document), Some(anchors)) = (&document, &anchors) {
            for anchor in document.select(anchors) {
                page.add_anchor(anchor);
            }
        }
        return page.edges;
    }

    for rule in rules.rules() {
        match &rule.kind {
            RuleKind::Structural(selector) => {
                let (Some(document), Some(anchors)) = (&document, &anchors) else {
                    continue;
                };
                for element in document.select(selector) {
                    if element.value().name() == "a" {
                        page.add_anchor(element);
                    } else {
                        for anchor in element.select(anchors) {
                            page.add_anchor(anchor);
                        }
                    }
                }
            }
            RuleKind::Shortcode(pattern) => {
                for url in pattern.find_urls(html) {
                    page.add(url, Some(pattern.anchor_text()));
                }
            }
        }
    }

    page.edges
}

fn anchor_selector() -> Option<Selector> {
    Selector::parse("a[href]").ok()
}

fn anchor_text(anchor: ElementRef<'_>) -> Option<String> {
    let text = anchor.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
