//! Request/response envelopes for driving a crawl from JSON
//!
//! A batch request names the pages to crawl and the rules to apply; the
//! response carries every edge found plus one entry per failed page. The
//! single-page variant is meant for checking what a rule set picks up on one
//! URL. Rule objects use the same shape as `[[rule]]` config tables, and
//! `selectors` / `selector` are accepted as aliases for `rules` / `pattern`.

use crate::config::SelectorRule;
use crate::crawler::{BatchCrawler, CrawlError, Fetcher};
use crate::extract::{Edge, RuleSet};
use serde::{Deserialize, Serialize};

/// Crawl a list of pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, alias = "selectors")]
    pub rules: Vec<SelectorRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub success: bool,
    #[serde(default)]
    pub links: Vec<Edge>,
    #[serde(default)]
    pub errors: Vec<CrawlError>,
    #[serde(default)]
    pub crawled_count: usize,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResponse {
    fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Crawl one page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "selectors")]
    pub rules: Vec<SelectorRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResponse {
    pub success: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub links: Vec<Edge>,
    #[serde(default)]
    pub link_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs a batch request through a configured crawler
///
/// Page failures never fail the request: they are listed in `errors` and
/// the response is still successful. Only a request without URLs is rejected.
///
/// # Example
///
/// ```no_run
/// use link_matrix::api::{handle_batch, BatchRequest};
/// use link_matrix::crawler::{BatchCrawler, HttpFetcher};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let crawler = BatchCrawler::new(HttpFetcher::new(Duration::from_secs(30))?);
/// let request: BatchRequest = serde_json::from_str(r#"{"urls": ["https://example.com/a"]}"#)?;
/// let response = handle_batch(&crawler, &request).await;
/// println!("{}", serde_json::to_string_pretty(&response)?);
/// # Ok(())
/// # }
/// ```
pub async fn handle_batch<F: Fetcher>(
    crawler: &BatchCrawler<F>,
    request: &BatchRequest,
) -> BatchResponse {
    if request.urls.is_empty() {
        return BatchResponse::rejected("urls array is required");
    }

    let rules = RuleSet::compile(&request.rules);
    let result = crawler.crawl(&request.urls, &rules).await;
    let total_count = request.urls.len();

    BatchResponse {
        success: true,
        crawled_count: result.crawled_count(total_count),
        total_count,
        links: result.links,
        errors: result.errors,
        error: None,
    }
}

/// Runs a single-page request
///
/// Unlike a batch, a fetch failure here fails the whole response.
pub async fn handle_single<F: Fetcher>(
    crawler: &BatchCrawler<F>,
    request: &SingleRequest,
) -> SingleResponse {
    let url = request.url.trim();
    if url.is_empty() {
        return SingleResponse {
            success: false,
            error: Some("url is required".to_string()),
            ..SingleResponse::default()
        };
    }

    let rules = RuleSet::compile(&request.rules);
    let page = crawler.extract_one(url, &rules).await;

    SingleResponse {
        success: page.error.is_none(),
        url: url.to_string(),
        link_count: page.links.len(),
        links: page.links,
        error: page.error,
    }
}
