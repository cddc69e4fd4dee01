//! HTTP fetcher implementation
//!
//! The orchestrator only needs "GET this URL, give me status and body".
//! That capability is the [`Fetcher`] trait so tests and embedders can
//! supply their own transport; [`HttpFetcher`] is the reqwest-backed one.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// User agent sent with every page request
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; InternalLinkChecker/1.0)";

/// Accept header sent with every page request
pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// A raw page response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// True for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Why a single page could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Failed to read body: {0}")]
    Body(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect(e.to_string())
        } else if e.is_body() || e.is_decode() {
            FetchError::Body(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// The GET capability the crawler is built on
///
/// Implementations return the status and body of any completed response,
/// including non-2xx ones; the crawler decides what counts as a failure.
/// Transport problems are reported as `Err`.
pub trait Fetcher {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send {
        (**self).get(url)
    }
}

/// Builds an HTTP client with the crawler's headers
///
/// # Arguments
///
/// * `timeout` - Overall per-request timeout; an unresponsive host would
///   otherwise hold its whole group open
///
/// # Example
///
/// ```no_run
/// use link_matrix::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with its own client
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(timeout)?,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse, FetchError>> + Send {
        let request = self.client.get(url);
        async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok(FetchResponse { status, body })
        }
    }
}
