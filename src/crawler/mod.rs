//! Crawler module for page fetching and batch orchestration
//!
//! This module contains the crawling logic, including:
//! - The injectable GET capability and its reqwest implementation
//! - Grouped, concurrency-bounded batch crawling
//! - Per-page failure isolation and progress reporting
//! - A single-page variant for debugging rule sets
//! - Full runs that persist their results

mod batch;
mod coordinator;
mod fetcher;

pub use batch::{crawl_batch, BatchCrawler, CrawlError, CrawlResult, PageResult, ProgressCallback};
pub use coordinator::crawl;
pub use fetcher::{
    build_http_client, FetchError, FetchResponse, Fetcher, HttpFetcher, ACCEPT_HTML, USER_AGENT,
};

use crate::config::Config;
use crate::extract::RuleSet;
use crate::LinkMatrixError;

/// Builds a crawler with the configured timeout, group size and pause
pub fn crawler_from_config(config: &Config) -> Result<BatchCrawler<HttpFetcher>, LinkMatrixError> {
    let fetcher = HttpFetcher::new(config.crawler.request_timeout())?;

    Ok(BatchCrawler::new(fetcher)
        .with_concurrency(config.crawler.concurrency)
        .with_inter_batch_delay(config.crawler.inter_batch_delay()))
}

/// Crawls every article of a configuration
///
/// Builds the HTTP fetcher from the crawler settings, compiles the
/// configured rules and runs one batch over all article URLs.
///
/// # Arguments
///
/// * `config` - The loaded configuration
/// * `progress` - Optional per-page progress callback
///
/// # Returns
///
/// * `Ok(CrawlResult)` - The batch ran (individual pages may still have failed)
/// * `Err(LinkMatrixError)` - The HTTP client could not be built
pub async fn crawl_articles(
    config: &Config,
    progress: Option<ProgressCallback>,
) -> Result<CrawlResult, LinkMatrixError> {
    let rules = RuleSet::compile(&config.rules);

    let mut crawler = crawler_from_config(config)?;
    if let Some(progress) = progress {
        crawler = crawler.with_progress_callback(progress);
    }

    Ok(crawler.crawl(&config.article_urls(), &rules).await)
}
