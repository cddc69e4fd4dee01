//! Link-Matrix: an internal link mapper for a set of tracked articles
//!
//! This crate fetches a known list of pages, extracts the internal links each
//! page carries according to configurable selector rules, and builds a
//! queryable link graph showing who links to whom. It is used to surface
//! orphaned articles and uneven link distribution across a site.

pub mod api;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod graph;
pub mod report;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Link-Matrix operations
#[derive(Debug, Error)]
pub enum LinkMatrixError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] report::OutputError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Link-Matrix operations
pub type Result<T> = std::result::Result<T, LinkMatrixError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Article, Config, SelectorRule};
pub use crawler::{crawl_batch, BatchCrawler, CrawlError, CrawlResult, Fetcher, HttpFetcher};
pub use extract::{extract, Edge, RuleSet};
pub use graph::{IncomingLink, LinkGraph};
pub use crate::url::{canonical_key, resolve, same_domain, NormalizedKey};
