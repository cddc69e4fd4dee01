//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use link_matrix::api::{handle_batch, handle_single, BatchRequest, SingleRequest};
use link_matrix::config::{Article, Config, CrawlerConfig, OutputConfig, SelectorRule};
use link_matrix::crawler::{
    crawl, crawl_articles, crawl_batch, crawler_from_config, HttpFetcher, USER_AGENT,
};
use link_matrix::extract::RuleSet;
use link_matrix::graph::LinkGraph;
use link_matrix::storage::{RunStatus, SqliteStorage, Storage};
use link_matrix::url::canonical_key;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration tracking the given articles
fn create_test_config(articles: Vec<Article>, rules: Vec<SelectorRule>, dir: &Path) -> Config {
    Config {
        crawler: CrawlerConfig {
            concurrency: 2,
            inter_batch_delay: 0,
            request_timeout: 5,
        },
        output: OutputConfig {
            database_path: dir.join("links.db").to_string_lossy().into_owned(),
            summary_path: dir.join("summary.md").to_string_lossy().into_owned(),
        },
        articles,
        rules,
    }
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Three linked articles plus one that answers 500
async fn start_site() -> (MockServer, Vec<Article>) {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/a",
        r#"<html><body>
        <article>
          <a href="/b">Read B</a>
          <a href="/c/">Read C</a>
          <a href="https://elsewhere.example/x">External</a>
        </article>
        </body></html>"#,
    )
    .await;

    mount_page(
        &server,
        "/b",
        r#"<html><body>
        <nav><a href="/c">Nav C</a></nav>
        <div class="related"><a href="/a">Back to A</a></div>
        <p>[blogcard url="/c"]</p>
        </body></html>"#,
    )
    .await;

    mount_page(&server, "/c", "<html><body>No links here</body></html>").await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let articles = vec![
        Article::new("a", "Article A", format!("{}/a", base)).with_genre("Guides"),
        Article::new("b", "Article B", format!("{}/b", base)).with_genre("Guides"),
        Article::new("c", "Article C", format!("{}/c", base)),
        Article::new("broken", "Broken", format!("{}/broken", base)),
    ];

    (server, articles)
}

fn key(server: &MockServer, route: &str) -> String {
    canonical_key(&format!("{}{}", server.uri(), route)).into()
}

#[tokio::test]
async fn test_fetcher_sends_crawler_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .and(header("user-agent", USER_AGENT))
        .and(header_exists("accept"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<a href=\"/b\">B</a>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).expect("client");
    let urls = vec![format!("{}/a", server.uri())];
    let result = crawl_batch(&fetcher, &urls, &RuleSet::all_links(), 5, Duration::ZERO, None).await;

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    assert_eq!(result.links.len(), 1);
    assert_eq!(result.links[0].target_url, format!("{}/b", server.uri()));
}

#[tokio::test]
async fn test_end_to_end_fallback_extraction() {
    let (server, articles) = start_site().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(articles.clone(), Vec::new(), dir.path());

    let result = crawl_articles(&config, None).await.expect("crawl");

    assert_eq!(result.crawled_count(articles.len()), 3);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, format!("{}/broken", server.uri()));
    assert_eq!(result.errors[0].error, "HTTP status 500");

    let graph = LinkGraph::build(&articles, &result.links);
    let (a, b, c) = (key(&server, "/a"), key(&server, "/b"), key(&server, "/c"));

    assert!(graph.has_link(&a, &b));
    assert!(graph.has_link(&a, &c));
    assert!(graph.has_link(&b, &a));
    assert!(graph.has_link(&b, &c));
    assert!(!graph.has_link(&c, &a));
    assert_eq!(graph.out_degree(&a), 2);
    assert_eq!(graph.in_degree(&c), 2);

    let incoming = graph.incoming_edges(&b);
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].anchor_text.as_deref(), Some("Read B"));
    assert_eq!(incoming[0].source_article.id, "a");

    let orphans: Vec<&str> = graph.orphans().iter().map(|(_, a)| a.id.as_str()).collect();
    assert_eq!(orphans, vec!["broken"]);
}

#[tokio::test]
async fn test_rules_narrow_extraction() {
    let (server, articles) = start_site().await;
    let dir = tempfile::tempdir().unwrap();
    let rules = vec![
        SelectorRule::new("related", "Related box", ".related", true),
        SelectorRule::new("card", "Blog card", "[blogcard url=\"\"]", true),
        SelectorRule::new("nav", "Navigation", "nav a", false),
    ];
    let config = create_test_config(articles[1..2].to_vec(), rules, dir.path());

    let result = crawl_articles(&config, None).await.expect("crawl");

    let found: Vec<(&str, Option<&str>)> = result
        .links
        .iter()
        .map(|e| (e.target_url.as_str(), e.anchor_text.as_deref()))
        .collect();
    let base = server.uri();
    assert_eq!(
        found,
        vec![
            (format!("{}/a", base).as_str(), Some("Back to A")),
            (format!("{}/c", base).as_str(), Some("[blogcard]")),
        ]
    );
}

#[tokio::test]
async fn test_full_run_persists_results() {
    let (server, articles) = start_site().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(articles, Vec::new(), dir.path());

    let summary = crawl(&config, "test-hash").await.expect("run");
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.report.orphans().len(), 1);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path)).unwrap();
    let run = storage.get_latest_run().unwrap().expect("run recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.total_count, 4);
    assert_eq!(run.crawled_count, Some(3));

    let links = storage.load_links(run.id).unwrap();
    let graph = LinkGraph::build(&config.articles, &links);
    assert!(graph.has_link(&key(&server, "/a"), &key(&server, "/b")));

    let markdown = std::fs::read_to_string(&config.output.summary_path).unwrap();
    assert!(markdown.contains("## Orphaned Articles"));
    assert!(markdown.contains("HTTP status 500"));
}

#[tokio::test]
async fn test_api_envelopes_over_http() {
    let (server, articles) = start_site().await;
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(articles, Vec::new(), dir.path());
    let crawler = crawler_from_config(&config).unwrap();

    let single = handle_single(
        &crawler,
        &SingleRequest {
            url: format!("{}/a", server.uri()),
            rules: Vec::new(),
        },
    )
    .await;
    assert!(single.success);
    assert_eq!(single.link_count, 2);

    let batch = handle_batch(
        &crawler,
        &BatchRequest {
            urls: config.article_urls(),
            rules: Vec::new(),
        },
    )
    .await;
    assert!(batch.success);
    assert_eq!(batch.total_count, 4);
    assert_eq!(batch.crawled_count, 3);

    let json = serde_json::to_value(&batch).unwrap();
    assert_eq!(json["errors"][0]["error"], "HTTP status 500");
}

#[tokio::test]
async fn test_unreachable_page_is_isolated() {
    let (server, _) = start_site().await;
    let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
    let urls = vec![
        format!("{}/a", server.uri()),
        "http://127.0.0.1:1/nothing".to_string(),
        format!("{}/c", server.uri()),
    ];

    let result = crawl_batch(&fetcher, &urls, &RuleSet::all_links(), 2, Duration::ZERO, None).await;

    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].url, "http://127.0.0.1:1/nothing");
    assert_eq!(result.links.len(), 2);
    assert_eq!(result.crawled_count(urls.len()), 2);
}
