//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::CrawlError;
use crate::extract::Edge;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No crawl runs found in database")]
    NoRuns,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// A run is created before crawling, its edges and failures are saved once
/// the batch has finished, and it is then marked completed. Loading a run's
/// edges back yields them in the order they were saved, so a graph rebuilt
/// from storage lists incoming links exactly like the live one.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    /// * `total` - Number of pages the run will crawl
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, total: usize) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed with a finish timestamp and crawled count
    fn complete_run(&mut self, run_id: i64, crawled: usize) -> StorageResult<()>;

    /// Marks a run as failed with a finish timestamp
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Crawl Results =====

    /// Saves the edges of a run, preserving their order
    fn save_links(&mut self, run_id: i64, links: &[Edge]) -> StorageResult<()>;

    /// Saves the per-page failures of a run
    fn save_errors(&mut self, run_id: i64, errors: &[CrawlError]) -> StorageResult<()>;

    /// Loads the edges of a run in the order they were saved
    fn load_links(&self, run_id: i64) -> StorageResult<Vec<Edge>>;

    /// Loads the per-page failures of a run
    fn load_errors(&self, run_id: i64) -> StorageResult<Vec<CrawlError>>;

    /// Counts the edges of a run
    fn count_links(&self, run_id: i64) -> StorageResult<u64>;
}
