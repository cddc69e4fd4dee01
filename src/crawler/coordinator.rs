//! Crawler coordinator - one full crawl run
//!
//! This module ties a run together:
//! - Opening storage and recording the run
//! - Crawling every tracked article
//! - Persisting the edges and per-page failures
//! - Writing the markdown summary

use crate::config::Config;
use crate::crawler::{crawl_articles, CrawlResult, ProgressCallback};
use crate::report::{generate_markdown_summary, generate_summary, RunSummary};
use crate::storage::{SqliteStorage, Storage, StorageResult};
use crate::LinkMatrixError;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete crawl and stores its results
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished; pages may still have failed individually
/// * `Err(LinkMatrixError)` - Storage or the HTTP client could not be set up
pub async fn crawl(config: &Config, config_hash: &str) -> Result<RunSummary, LinkMatrixError> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let total = config.articles.len();
    let run_id = storage.create_run(config_hash, total)?;

    tracing::info!("Starting run {} over {} articles", run_id, total);

    let progress: ProgressCallback = Arc::new(|done: usize, total: usize, url: &str| {
        tracing::info!("[{}/{}] {}", done, total, url);
    });

    let result = match crawl_articles(config, Some(progress)).await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Run {} failed: {}", run_id, e);
            storage.fail_run(run_id)?;
            return Err(e);
        }
    };

    record_results(&mut storage, run_id, &result, total)?;

    let summary = generate_summary(&storage, &config.articles)?;
    generate_markdown_summary(&summary, Path::new(&config.output.summary_path))?;

    tracing::info!(
        "Run {} completed: {} links, {} orphaned articles, summary written to {}",
        run_id,
        result.links.len(),
        summary.report.orphans().len(),
        config.output.summary_path
    );

    Ok(summary)
}

/// Saves a finished batch and completes the run
///
/// If any write fails the run is marked failed before the error is returned,
/// so no run is left `running` after its crawl has ended.
fn record_results<S: Storage>(
    storage: &mut S,
    run_id: i64,
    result: &CrawlResult,
    total: usize,
) -> StorageResult<()> {
    let saved = storage
        .save_links(run_id, &result.links)
        .and_then(|()| storage.save_errors(run_id, &result.errors))
        .and_then(|()| storage.complete_run(run_id, result.crawled_count(total)));

    if let Err(e) = saved {
        tracing::error!("Run {} failed while saving results: {}", run_id, e);
        if let Err(mark) = storage.fail_run(run_id) {
            tracing::warn!("Could not mark run {} as failed: {}", run_id, mark);
        }
        return Err(e);
    }

    Ok(())
}
