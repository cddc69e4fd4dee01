//! Link graph over the tracked articles
//!
//! The graph keeps two independently owned indexes built in one pass:
//! - forward: page → set of distinct pages it links to (matrix cell lookups)
//! - reverse: page → every edge pointing at it, in crawl order, with the
//!   anchor text and the linking article ("who links here")
//!
//! Only edges between two tracked articles are kept. The graph is immutable;
//! a new crawl builds a new one.

use crate::config::Article;
use crate::extract::Edge;
use crate::url::{canonical_key, NormalizedKey};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One edge pointing at a page, with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingLink {
    pub source_url: String,
    pub anchor_text: Option<String>,
    pub source_article: Article,
}

/// Queryable link structure of one crawl
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    nodes: HashMap<NormalizedKey, Article>,
    order: Vec<NormalizedKey>,
    forward: HashMap<NormalizedKey, HashSet<NormalizedKey>>,
    reverse: HashMap<NormalizedKey, Vec<IncomingLink>>,
}

impl LinkGraph {
    /// Builds the graph from the tracked articles and the crawled edges
    ///
    /// # Build Steps
    ///
    /// 1. Key every article by its normalized URL (a later article with the
    ///    same key replaces an earlier one)
    /// 2. Normalize both ends of each edge; drop it unless both are tracked
    /// 3. Insert into the forward set (repeated pairs collapse)
    /// 4. Append to the reverse list (every edge kept, in input order)
    ///
    /// # Example
    ///
    /// ```
    /// use link_matrix::{Article, Edge, LinkGraph};
    ///
    /// let articles = vec![
    ///     Article::new("a", "A", "https://ex.com/a"),
    ///     Article::new("b", "B", "https://ex.com/b"),
    /// ];
    /// let edges = vec![Edge {
    ///     source_url: "https://ex.com/a".to_string(),
    ///     target_url: "https://ex.com/b".to_string(),
    ///     anchor_text: Some("B".to_string()),
    /// }];
    ///
    /// let graph = LinkGraph::build(&articles, &edges);
    /// assert!(graph.has_link("ex.com/a", "ex.com/b"));
    /// assert_eq!(graph.in_degree("ex.com/b"), 1);
    /// ```
    pub fn build(articles: &[Article], edges: &[Edge]) -> Self {
        let mut nodes = HashMap::with_capacity(articles.len());
        let mut order = Vec::with_capacity(articles.len());

        for article in articles {
            let key = canonical_key(&article.url);
            if nodes.insert(key.clone(), article.clone()).is_none() {
                order.push(key);
            }
        }

        let mut forward: HashMap<NormalizedKey, HashSet<NormalizedKey>> = HashMap::new();
        let mut reverse: HashMap<NormalizedKey, Vec<IncomingLink>> = HashMap::new();
        let mut dropped = 0usize;

        for edge in edges {
            let source = canonical_key(&edge.source_url);
            let target = canonical_key(&edge.target_url);

            let Some(source_article) = nodes.get(&source) else {
                dropped += 1;
                continue;
            };
            if !nodes.contains_key(&target) {
                dropped += 1;
                continue;
            }

            reverse.entry(target.clone()).or_default().push(IncomingLink {
                source_url: edge.source_url.clone(),
                anchor_text: edge.anchor_text.clone(),
                source_article: source_article.clone(),
            });
            forward.entry(source).or_default().insert(target);
        }

        tracing::debug!(
            "Built link graph: {} articles, {} of {} edges kept",
            order.len(),
            edges.len() - dropped,
            edges.len()
        );

        Self {
            nodes,
            order,
            forward,
            reverse,
        }
    }

    /// True if `source` links to `target` (both normalized keys)
    pub fn has_link(&self, source: &str, target: &str) -> bool {
        self.forward
            .get(source)
            .is_some_and(|targets| targets.contains(target))
    }

    /// Number of distinct tracked pages `key` links to
    pub fn out_degree(&self, key: &str) -> usize {
        self.forward.get(key).map_or(0, HashSet::len)
    }

    /// Number of edges pointing at `key`
    ///
    /// Counts every contributing edge, so two differently-written URLs of the
    /// same source page count twice.
    pub fn in_degree(&self, key: &str) -> usize {
        self.reverse.get(key).map_or(0, Vec::len)
    }

    /// Edges pointing at `key`, in crawl order
    pub fn incoming_edges(&self, key: &str) -> &[IncomingLink] {
        self.reverse.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct tracked pages `key` links to (unordered)
    pub fn outgoing(&self, key: &str) -> impl Iterator<Item = &NormalizedKey> {
        self.forward.get(key).into_iter().flatten()
    }

    /// The article tracked under `key`
    pub fn article(&self, key: &str) -> Option<&Article> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Tracked articles with their keys, in first-seen article order
    pub fn nodes(&self) -> impl Iterator<Item = (&NormalizedKey, &Article)> {
        self.order
            .iter()
            .filter_map(move |key| self.nodes.get(key).map(|article| (key, article)))
    }

    /// Number of distinct source → target pairs
    pub fn edge_count(&self) -> usize {
        self.forward.values().map(HashSet::len).sum()
    }

    /// Tracked articles nothing links to, in article order
    pub fn orphans(&self) -> Vec<(&NormalizedKey, &Article)> {
        self.nodes()
            .filter(|(key, _)| self.in_degree(key.as_str()) == 0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
