//! Link report generation
//!
//! This module turns a link graph into per-article rows:
//! - Incoming/outgoing counts and an incoming-link bucket per article
//! - Orphan detection, genre and bucket filters, free-text search
//! - Markdown summaries and console statistics of a stored run

mod markdown;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::print_statistics;

use crate::config::Article;
use crate::crawler::CrawlError;
use crate::graph::LinkGraph;
use crate::storage::{RunRecord, Storage, StorageError};
use crate::LinkMatrixError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How well linked an article is, by incoming edge count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomingBucket {
    /// No incoming links
    Orphan,
    /// 1 to 3
    Few,
    /// 4 to 10
    Moderate,
    /// More than 10
    Many,
}

impl IncomingBucket {
    pub const ALL: [IncomingBucket; 4] = [
        IncomingBucket::Orphan,
        IncomingBucket::Few,
        IncomingBucket::Moderate,
        IncomingBucket::Many,
    ];

    pub fn from_count(incoming: usize) -> Self {
        match incoming {
            0 => Self::Orphan,
            1..=3 => Self::Few,
            4..=10 => Self::Moderate,
            _ => Self::Many,
        }
    }

    /// Human-readable range, as used in report tables
    pub fn range(&self) -> &'static str {
        match self {
            Self::Orphan => "0",
            Self::Few => "1-3",
            Self::Moderate => "4-10",
            Self::Many => "11+",
        }
    }
}

impl fmt::Display for IncomingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Orphan => "orphan",
            Self::Few => "few",
            Self::Moderate => "moderate",
            Self::Many => "many",
        };
        f.write_str(name)
    }
}

/// One tracked article and its link counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub id: String,
    pub label: String,
    pub url: String,
    pub genre: Option<String>,
    pub incoming: usize,
    pub outgoing: usize,
    pub bucket: IncomingBucket,
}

impl ReportRow {
    fn new(article: &Article, incoming: usize, outgoing: usize) -> Self {
        Self {
            id: article.id.clone(),
            label: article.label.clone(),
            url: article.url.clone(),
            genre: article.genre.clone(),
            incoming,
            outgoing,
            bucket: IncomingBucket::from_count(incoming),
        }
    }
}

/// Per-article view of a link graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    rows: Vec<ReportRow>,
    edge_count: usize,
}

impl LinkReport {
    /// Builds one row per tracked article, in article order
    pub fn from_graph(graph: &LinkGraph) -> Self {
        let rows = graph
            .nodes()
            .map(|(key, article)| {
                ReportRow::new(
                    article,
                    graph.in_degree(key.as_str()),
                    graph.out_degree(key.as_str()),
                )
            })
            .collect();

        Self {
            rows,
            edge_count: graph.edge_count(),
        }
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    /// Number of distinct source → target pairs in the graph
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn bucket_count(&self, bucket: IncomingBucket) -> usize {
        self.rows.iter().filter(|row| row.bucket == bucket).count()
    }

    pub fn orphans(&self) -> Vec<&ReportRow> {
        self.filter_bucket(IncomingBucket::Orphan)
    }

    /// Distinct genres, sorted
    pub fn genres(&self) -> Vec<&str> {
        let mut genres: Vec<&str> = self
            .rows
            .iter()
            .filter_map(|row| row.genre.as_deref())
            .collect();
        genres.sort_unstable();
        genres.dedup();
        genres
    }

    pub fn filter_genre(&self, genre: &str) -> Vec<&ReportRow> {
        self.rows
            .iter()
            .filter(|row| row.genre.as_deref() == Some(genre))
            .collect()
    }

    pub fn filter_bucket(&self, bucket: IncomingBucket) -> Vec<&ReportRow> {
        self.rows.iter().filter(|row| row.bucket == bucket).collect()
    }

    /// Case-insensitive substring match on label, URL or genre
    pub fn search(&self, query: &str) -> Vec<&ReportRow> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.rows.iter().collect();
        }

        self.rows
            .iter()
            .filter(|row| {
                row.label.to_lowercase().contains(&query)
                    || row.url.to_lowercase().contains(&query)
                    || row
                        .genre
                        .as_ref()
                        .is_some_and(|g| g.to_lowercase().contains(&query))
            })
            .collect()
    }
}

/// Everything known about one stored run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run: RunRecord,
    pub report: LinkReport,
    pub errors: Vec<CrawlError>,
    pub total_links: u64,
}

/// Generates a summary of the latest run from storage
///
/// The graph is rebuilt from the run's stored edges and the given articles.
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
/// * `articles` - The tracked articles
///
/// # Returns
///
/// * `Ok(RunSummary)` - Successfully generated summary
/// * `Err(LinkMatrixError)` - No run exists or the database could not be read
pub fn generate_summary(
    storage: &dyn Storage,
    articles: &[Article],
) -> Result<RunSummary, LinkMatrixError> {
    let run = storage.get_latest_run()?.ok_or(StorageError::NoRuns)?;

    let links = storage.load_links(run.id)?;
    let errors = storage.load_errors(run.id)?;
    let graph = LinkGraph::build(articles, &links);

    Ok(RunSummary {
        report: LinkReport::from_graph(&graph),
        total_links: links.len() as u64,
        errors,
        run,
    })
}
