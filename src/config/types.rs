use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of pages fetched together in one group
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default pause between two groups (milliseconds)
pub const DEFAULT_INTER_BATCH_DELAY_MS: u64 = 500;

/// Default per-request timeout (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for Link-Matrix
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "article")]
    pub articles: Vec<Article>,
    #[serde(default = "SelectorRule::defaults", rename = "rule")]
    pub rules: Vec<SelectorRule>,
}

impl Config {
    /// URLs of every configured article, in configuration order
    pub fn article_urls(&self) -> Vec<String> {
        self.articles.iter().map(|a| a.url.clone()).collect()
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of pages fetched concurrently in one group
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Pause between two groups (milliseconds)
    #[serde(rename = "inter-batch-delay", default = "default_inter_batch_delay")]
    pub inter_batch_delay: u64,

    /// Timeout for a single page request (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl CrawlerConfig {
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY_MS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_inter_batch_delay() -> u64 {
    DEFAULT_INTER_BATCH_DELAY_MS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown link report
    #[serde(rename = "summary-path")]
    pub summary_path: String,
}

/// A tracked page
///
/// Graph identity is the normalized `url`; `id` is an opaque row identifier
/// handed through from the article source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,

    /// Human readable name (the sheet's keyword column)
    #[serde(alias = "keyword")]
    pub label: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

impl Article {
    pub fn new(id: impl Into<String>, label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            url: url.into(),
            genre: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }
}

/// A user-managed link matching rule
///
/// `pattern` is either a CSS selector or a shortcode pattern such as
/// `[blogcard url=""]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRule {
    pub id: String,
    pub name: String,
    #[serde(alias = "selector")]
    pub pattern: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl SelectorRule {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pattern: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            pattern: pattern.into(),
            enabled,
        }
    }

    /// The built-in rule set offered to a new configuration
    ///
    /// Only "all links" is enabled; the others cover common blog layouts
    /// (main content area, internal link cards, blog card shortcodes).
    pub fn defaults() -> Vec<SelectorRule> {
        vec![
            SelectorRule::new("default-all-links", "All links", "a", true),
            SelectorRule::new(
                "default-content-links",
                "Main content",
                "main a, article a, .entry-content a, .content a",
                false,
            ),
            SelectorRule::new(
                "default-lkc-internal",
                "Link card (internal)",
                ".lkc-internal-wrap a.lkc-link",
                false,
            ),
            SelectorRule::new(
                "default-blogcard-shortcode",
                "Blog card (shortcode)",
                "[blogcard url=\"\"]",
                false,
            ),
            SelectorRule::new(
                "default-blogcard-css",
                "Blog card (CSS)",
                ".blogcard a, a.blogcard",
                false,
            ),
        ]
    }
}
