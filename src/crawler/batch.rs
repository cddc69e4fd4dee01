//! Batch crawl orchestration
//!
//! URLs are fetched in sequential groups of `concurrency`. Every page of a
//! group is in flight at once inside the calling task; the group is joined
//! before the next one starts, with a pause between groups. A page that fails
//! is recorded and never stops the batch.

use crate::config::{DEFAULT_CONCURRENCY, DEFAULT_INTER_BATCH_DELAY_MS};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::extract::{extract, Edge, RuleSet};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Called after each page settles with `(completed, total, url)`
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// A page that could not be crawled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlError {
    pub url: String,
    pub error: String,
}

/// Outcome of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlResult {
    /// Edges from every page that was crawled, in group order
    pub links: Vec<Edge>,
    /// One entry per page that failed
    pub errors: Vec<CrawlError>,
}

impl CrawlResult {
    /// Number of pages that were fetched and parsed out of `total`
    pub fn crawled_count(&self, total: usize) -> usize {
        total.saturating_sub(self.errors.len())
    }
}

/// Outcome of a single-page crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub links: Vec<Edge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct PageOutcome<'u> {
    url: &'u str,
    result: Result<Vec<Edge>, FetchError>,
}

/// Crawls lists of pages through a [`Fetcher`]
///
/// The crawler holds no state between calls; running the same batch twice
/// over unchanged pages yields the same edges.
///
/// # Example
///
/// ```no_run
/// use link_matrix::crawler::{BatchCrawler, HttpFetcher};
/// use link_matrix::extract::RuleSet;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = HttpFetcher::new(Duration::from_secs(30))?;
/// let crawler = BatchCrawler::new(fetcher).with_concurrency(3);
/// let urls = vec!["https://example.com/a".to_string()];
/// let result = crawler.crawl(&urls, &RuleSet::all_links()).await;
/// println!("{} links, {} errors", result.links.len(), result.errors.len());
/// # Ok(())
/// # }
/// ```
pub struct BatchCrawler<F> {
    fetcher: F,
    concurrency: usize,
    inter_batch_delay: Duration,
    progress_callback: Option<ProgressCallback>,
}

impl<F: Fetcher> BatchCrawler<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_CONCURRENCY,
            inter_batch_delay: Duration::from_millis(DEFAULT_INTER_BATCH_DELAY_MS),
            progress_callback: None,
        }
    }

    /// Sets the group size (a value of 0 is treated as 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Crawls every URL and gathers the edges and failures
    pub async fn crawl(&self, urls: &[String], rules: &RuleSet) -> CrawlResult {
        let total = urls.len();
        let group_count = total.div_ceil(self.concurrency);
        let started = Instant::now();
        let mut result = CrawlResult::default();
        let mut completed = 0;

        tracing::info!(
            "Crawling {} pages in {} groups of up to {}",
            total,
            group_count,
            self.concurrency
        );

        for (index, group) in urls.chunks(self.concurrency).enumerate() {
            if index > 0 && !self.inter_batch_delay.is_zero() {
                tokio::time::sleep(self.inter_batch_delay).await;
            }

            tracing::debug!("Starting group {}/{} ({} pages)", index + 1, group_count, group.len());

            let mut in_flight: FuturesUnordered<_> = group
                .iter()
                .map(|url| self.crawl_page(url, rules))
                .collect();

            let mut settled = Vec::with_capacity(group.len());
            while let Some(outcome) = in_flight.next().await {
                completed += 1;
                if let Some(callback) = &self.progress_callback {
                    callback(completed, total, outcome.url);
                }
                settled.push(outcome);
            }

            for outcome in settled {
                match outcome.result {
                    Ok(edges) => result.links.extend(edges),
                    Err(e) => result.errors.push(CrawlError {
                        url: outcome.url.to_string(),
                        error: e.to_string(),
                    }),
                }
            }
        }

        tracing::info!(
            "Batch finished: {} of {} pages crawled, {} links, {} errors in {:?}",
            result.crawled_count(total),
            total,
            result.links.len(),
            result.errors.len(),
            started.elapsed()
        );

        result
    }

    /// Crawls one page outside of any batch, for debugging a rule set
    pub async fn extract_one(&self, url: &str, rules: &RuleSet) -> PageResult {
        match self.crawl_page(url, rules).await.result {
            Ok(links) => PageResult { links, error: None },
            Err(e) => PageResult {
                links: Vec::new(),
                error: Some(e.to_string()),
            },
        }
    }

    async fn crawl_page<'u>(&self, url: &'u str, rules: &RuleSet) -> PageOutcome<'u> {
        let result = match self.fetch_html(url).await {
            Ok(html) => {
                let edges = extract(&html, url, rules);
                tracing::debug!("{} - found {} links", url, edges.len());
                Ok(edges)
            }
            Err(e) => {
                tracing::warn!("Failed to crawl {}: {}", url, e);
                Err(e)
            }
        };

        PageOutcome { url, result }
    }

    async fn fetch_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self.fetcher.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        Ok(response.body)
    }
}

/// Crawls a batch without building a [`BatchCrawler`] first
///
/// Same as [`BatchCrawler::new`] with
/// [`with_concurrency`](BatchCrawler::with_concurrency),
/// [`with_inter_batch_delay`](BatchCrawler::with_inter_batch_delay) and, when
/// given, [`with_progress_callback`](BatchCrawler::with_progress_callback).
pub async fn crawl_batch<F: Fetcher>(
    fetcher: F,
    urls: &[String],
    rules: &RuleSet,
    concurrency: usize,
    inter_batch_delay: Duration,
    progress: Option<ProgressCallback>,
) -> CrawlResult {
    let mut crawler = BatchCrawler::new(fetcher)
        .with_concurrency(concurrency)
        .with_inter_batch_delay(inter_batch_delay);
    if let Some(progress) = progress {
        crawler = crawler.with_progress_callback(progress);
    }

    crawler.crawl(urls, rules).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::FetchResponse;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    /// In-memory site that records when each request starts and ends
    #[derive(Default)]
    struct MockSite {
        pages: HashMap<String, FetchResponse>,
        events: Mutex<Vec<String>>,
        in_flight: Mutex<(usize, usize)>,
    }

    impl MockSite {
        fn page(mut self, url: &str, status: u16, body: &str) -> Self {
            self.pages
                .insert(url.to_string(), FetchResponse::new(status, body));
            self
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn max_in_flight(&self) -> usize {
            self.in_flight.lock().unwrap().1
        }

        fn position(&self, event: &str) -> usize {
            self.events()
                .iter()
                .position(|e| e == event)
                .unwrap_or_else(|| panic!("missing event {}", event))
        }
    }

    impl Fetcher for MockSite {
        fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send {
            let url = url.to_string();
            async move {
                self.events.lock().unwrap().push(format!("start {}", url));
                {
                    let mut counts = self.in_flight.lock().unwrap();
                    counts.0 += 1;
                    counts.1 = counts.1.max(counts.0);
                }

                tokio::time::sleep(Duration::from_millis(5)).await;

                self.in_flight.lock().unwrap().0 -= 1;
                self.events.lock().unwrap().push(format!("end {}", url));

                self.pages
                    .get(&url)
                    .cloned()
                    .ok_or_else(|| FetchError::Connect(format!("no route to {}", url)))
            }
        }
    }

    fn urls(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| format!("https://ex.com/{}", p)).collect()
    }

    fn site_of(paths: &[&str]) -> MockSite {
        paths.iter().fold(MockSite::default(), |site, p| {
            site.page(
                &format!("https://ex.com/{}", p),
                200,
                &format!(r#"<a href="/from-{}">link</a>"#, p),
            )
        })
    }

    #[tokio::test]
    async fn test_groups_run_behind_a_barrier() {
        let site = site_of(&["1", "2", "3", "4", "5"]);
        let crawler = BatchCrawler::new(&site)
            .with_concurrency(2)
            .with_inter_batch_delay(Duration::ZERO);

        let result = crawler
            .crawl(&urls(&["1", "2", "3", "4", "5"]), &RuleSet::all_links())
            .await;

        assert_eq!(result.links.len(), 5);
        assert!(result.errors.is_empty());
        assert_eq!(site.max_in_flight(), 2);

        // group 2 starts only after group 1 has fully settled, and so on
        let end_1 = site.position("end https://ex.com/1");
        let end_2 = site.position("end https://ex.com/2");
        let start_3 = site.position("start https://ex.com/3");
        let start_4 = site.position("start https://ex.com/4");
        let end_3 = site.position("end https://ex.com/3");
        let end_4 = site.position("end https://ex.com/4");
        let start_5 = site.position("start https://ex.com/5");
        assert!(start_3 > end_1.max(end_2));
        assert!(start_4 > end_1.max(end_2));
        assert!(start_5 > end_3.max(end_4));
    }

    #[tokio::test]
    async fn test_failure_in_first_group_is_isolated() {
        let site = site_of(&["2", "3", "4", "5"]).page("https://ex.com/1", 500, "oops");
        let crawler = BatchCrawler::new(&site)
            .with_concurrency(2)
            .with_inter_batch_delay(Duration::ZERO);

        let result = crawler
            .crawl(&urls(&["1", "2", "3", "4", "5"]), &RuleSet::all_links())
            .await;

        assert_eq!(
            result.errors,
            vec![CrawlError {
                url: "https://ex.com/1".to_string(),
                error: "HTTP status 500".to_string(),
            }]
        );
        assert_eq!(result.links.len(), 4);
        assert_eq!(result.crawled_count(5), 4);
        assert!(site.events().contains(&"end https://ex.com/5".to_string()));
    }

    #[tokio::test]
    async fn test_network_failures_recorded() {
        let site = site_of(&["ok"]);
        let crawler = BatchCrawler::new(&site).with_inter_batch_delay(Duration::ZERO);

        let result = crawler
            .crawl(&urls(&["ok", "missing"]), &RuleSet::all_links())
            .await;

        assert_eq!(result.links.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].url, "https://ex.com/missing");
        assert!(result.errors[0].error.contains("no route"));
    }

    #[tokio::test]
    async fn test_every_page_fails() {
        let site = MockSite::default();
        let crawler = BatchCrawler::new(&site).with_inter_batch_delay(Duration::ZERO);

        let result = crawler.crawl(&urls(&["a", "b", "c"]), &RuleSet::all_links()).await;

        assert!(result.links.is_empty());
        assert_eq!(result.errors.len(), 3);
    }

    #[tokio::test]
    async fn test_progress_reports_every_page() {
        let site = site_of(&["1", "2", "3"]).page("https://ex.com/bad", 404, "");
        let seen: Arc<Mutex<Vec<(usize, usize, String)>>> = Arc::default();
        let sink = seen.clone();

        let crawler = BatchCrawler::new(&site)
            .with_concurrency(2)
            .with_inter_batch_delay(Duration::ZERO)
            .with_progress_callback(Arc::new(move |done: usize, total: usize, url: &str| {
                sink.lock().unwrap().push((done, total, url.to_string()));
            }));

        crawler
            .crawl(&urls(&["1", "bad", "2", "3"]), &RuleSet::all_links())
            .await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!(
            seen.iter().map(|(done, _, _)| *done).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(seen.iter().all(|(_, total, _)| *total == 4));
        assert!(seen.iter().any(|(_, _, url)| url == "https://ex.com/bad"));
    }

    #[tokio::test]
    async fn test_zero_concurrency_treated_as_one() {
        let site = site_of(&["1", "2"]);
        let crawler = BatchCrawler::new(&site)
            .with_concurrency(0)
            .with_inter_batch_delay(Duration::ZERO);

        let result = crawler.crawl(&urls(&["1", "2"]), &RuleSet::all_links()).await;

        assert_eq!(crawler.concurrency(), 1);
        assert_eq!(result.links.len(), 2);
        assert_eq!(site.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let site = MockSite::default();
        let result = crawl_batch(&site, &[], &RuleSet::all_links(), 5, Duration::ZERO, None).await;
        assert_eq!(result, CrawlResult::default());
    }

    #[tokio::test]
    async fn test_crawl_batch_passes_delay_and_progress() {
        let site = site_of(&["1", "2", "3"]);
        let seen: Arc<Mutex<Vec<usize>>> = Arc::default();
        let sink = seen.clone();
        let progress: ProgressCallback = Arc::new(move |done: usize, _: usize, _: &str| {
            sink.lock().unwrap().push(done);
        });

        let started = Instant::now();
        let result = crawl_batch(
            &site,
            &urls(&["1", "2", "3"]),
            &RuleSet::all_links(),
            2,
            Duration::from_millis(40),
            Some(progress),
        )
        .await;

        assert_eq!(result.links.len(), 3);
        assert_eq!(site.max_in_flight(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        // one pause between the two groups
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_repeat_runs_match() {
        let site = site_of(&["1", "2", "3"]);
        let crawler = BatchCrawler::new(&site)
            .with_concurrency(3)
            .with_inter_batch_delay(Duration::ZERO);
        let batch = urls(&["1", "2", "3"]);

        let mut first = crawler.crawl(&batch, &RuleSet::all_links()).await.links;
        let mut second = crawler.crawl(&batch, &RuleSet::all_links()).await.links;
        first.sort_by(|a, b| a.source_url.cmp(&b.source_url));
        second.sort_by(|a, b| a.source_url.cmp(&b.source_url));

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_inter_batch_delay_applies_between_groups() {
        let site = site_of(&["1", "2", "3"]);
        let crawler = BatchCrawler::new(&site)
            .with_concurrency(1)
            .with_inter_batch_delay(Duration::from_millis(30));

        let started = Instant::now();
        crawler.crawl(&urls(&["1", "2", "3"]), &RuleSet::all_links()).await;

        // two pauses between three groups, none after the last
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn test_extract_one() {
        let site = site_of(&["a"]).page("https://ex.com/gone", 410, "");
        let crawler = BatchCrawler::new(&site);

        let ok = crawler.extract_one("https://ex.com/a", &RuleSet::all_links()).await;
        assert_eq!(ok.links.len(), 1);
        assert_eq!(ok.error, None);

        let failed = crawler
            .extract_one("https://ex.com/gone", &RuleSet::all_links())
            .await;
        assert!(failed.links.is_empty());
        assert_eq!(failed.error.as_deref(), Some("HTTP status 410"));
    }
}
