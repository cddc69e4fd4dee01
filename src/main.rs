//! Link-Matrix main entry point
//!
//! This is the command-line interface for the Link-Matrix internal link mapper.

use anyhow::Context;
use clap::Parser;
use link_matrix::api::{handle_batch, handle_single, BatchRequest, SingleRequest};
use link_matrix::config::{load_config_with_hash, Config};
use link_matrix::crawler::{crawl, crawler_from_config};
use link_matrix::extract::RuleSet;
use link_matrix::report::{generate_markdown_summary, generate_summary, print_statistics};
use link_matrix::storage::SqliteStorage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Link-Matrix: an internal link mapper
///
/// Link-Matrix fetches a known list of articles, extracts the links between
/// them according to configurable selector rules, and reports which
/// articles link to which, highlighting the ones nothing links to.
#[derive(Parser, Debug)]
#[command(name = "link-matrix")]
#[command(version = "1.0.0")]
#[command(about = "An internal link mapper", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export_summary", "url", "request"])]
    dry_run: bool,

    /// Show statistics of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export_summary", "url", "request"])]
    stats: bool,

    /// Generate markdown summary of the latest run and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "url", "request"])]
    export_summary: bool,

    /// Extract the links of a single page with the configured rules and print them as JSON
    #[arg(long, value_name = "URL", conflicts_with = "request")]
    url: Option<String>,

    /// Run a JSON batch request file and print the JSON response
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    request: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).with_context(|| format!("loading {}", cli.config.display()));
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export_summary {
        handle_export_summary(&config)?;
    } else if let Some(url) = &cli.url {
        handle_single_url(&config, url).await?;
    } else if let Some(path) = &cli.request {
        handle_request_file(&config, path).await?;
    } else {
        handle_crawl(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("link_matrix=info,warn"),
            1 => EnvFilter::new("link_matrix=debug,info"),
            2 => EnvFilter::new("link_matrix=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Link-Matrix Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Inter-batch delay: {}ms", config.crawler.inter_batch_delay);
    println!("  Request timeout: {}s", config.crawler.request_timeout);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Summary: {}", config.output.summary_path);

    let rules = RuleSet::compile(&config.rules);
    println!("\nRules ({}):", config.rules.len());
    for rule in &config.rules {
        let state = if rule.enabled { "on " } else { "off" };
        println!("  [{}] {} ({}): {}", state, rule.name, rule.id, rule.pattern);
    }
    if rules.is_fallback() {
        println!("  No rule enabled: every <a href> will count");
    }
    if rules.skipped_count() > 0 {
        println!("  {} enabled rule(s) skipped as invalid", rules.skipped_count());
    }

    println!("\nArticles ({}):", config.articles.len());
    for article in &config.articles {
        match &article.genre {
            Some(genre) => println!("  - {} [{}] {}", article.label, genre, article.url),
            None => println!("  - {} {}", article.label, article.url),
        }
    }

    let groups = config.articles.len().div_ceil(config.crawler.concurrency.max(1));
    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} articles in {} groups",
        config.articles.len(),
        groups
    );
}

/// Handles the --stats mode: shows statistics of the latest run
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let summary = generate_summary(&storage, &config.articles)?;

    print_statistics(&summary);

    Ok(())
}

/// Handles the --export-summary mode: generates markdown summary
fn handle_export_summary(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Link Summary ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.summary_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading run data from database...");
    let summary = generate_summary(&storage, &config.articles)?;

    tracing::info!("Generating markdown summary...");
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    println!("✓ Summary exported to: {}", config.output.summary_path);

    Ok(())
}

/// Handles --url: one page, configured rules, JSON to stdout
async fn handle_single_url(config: &Config, url: &str) -> anyhow::Result<()> {
    let crawler = crawler_from_config(config)?;
    let request = SingleRequest {
        url: url.to_string(),
        rules: config.rules.clone(),
    };

    let response = handle_single(&crawler, &request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Handles --request: batch request file in, batch response JSON out
async fn handle_request_file(config: &Config, path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading request file {}", path.display()))?;
    let request: BatchRequest = serde_json::from_str(&content)
        .with_context(|| format!("parsing request file {}", path.display()))?;

    let crawler = crawler_from_config(config)?;
    let response = handle_batch(&crawler, &request).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Articles: {}, Rules: {} ({} enabled)",
        config.articles.len(),
        config.rules.len(),
        config.rules.iter().filter(|r| r.enabled).count()
    );

    match crawl(config, config_hash).await {
        Ok(summary) => {
            tracing::info!("Crawl completed successfully");
            print_statistics(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
