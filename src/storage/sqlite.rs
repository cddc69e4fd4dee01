//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::CrawlError;
use crate::extract::Edge;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::LinkMatrixError;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, total_count, crawled_count";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(LinkMatrixError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, LinkMatrixError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, LinkMatrixError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        crawled: Option<usize>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, crawled_count = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, crawled, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let status: String = row.get(4)?;
    let status = RunStatus::from_db_string(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            Type::Text,
            format!("unknown run status '{}'", status).into(),
        )
    })?;

    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status,
        total_count: row.get(5)?,
        crawled_count: row.get(6)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, total: usize) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status, total_count) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, RunStatus::Running.to_db_string(), total],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn complete_run(&mut self, run_id: i64, crawled: usize) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed, Some(crawled))
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed, None)
    }

    // ===== Crawl Results =====

    fn save_links(&mut self, run_id: i64, links: &[Edge]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO links (run_id, source_url, target_url, anchor_text) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for link in links {
                stmt.execute(params![
                    run_id,
                    link.source_url,
                    link.target_url,
                    link.anchor_text
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} links for run {}", links.len(), run_id);
        Ok(())
    }

    fn save_errors(&mut self, run_id: i64, errors: &[CrawlError]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO crawl_errors (run_id, url, error, recorded_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for error in errors {
                stmt.execute(params![run_id, error.url, error.error, now])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_links(&self, run_id: i64) -> StorageResult<Vec<Edge>> {
        let mut stmt = self.conn.prepare(
            "SELECT source_url, target_url, anchor_text FROM links WHERE run_id = ?1 ORDER BY id",
        )?;

        let links = stmt
            .query_map(params![run_id], |row| {
                Ok(Edge {
                    source_url: row.get(0)?,
                    target_url: row.get(1)?,
                    anchor_text: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(links)
    }

    fn load_errors(&self, run_id: i64) -> StorageResult<Vec<CrawlError>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, error FROM crawl_errors WHERE run_id = ?1 ORDER BY id")?;

        let errors = stmt
            .query_map(params![run_id], |row| {
                Ok(CrawlError {
                    url: row.get(0)?,
                    error: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(errors)
    }

    fn count_links(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM links WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(source: &str, target: &str, anchor: Option<&str>) -> Edge {
        Edge {
            source_url: source.to_string(),
            target_url: target.to_string(),
            anchor_text: anchor.map(str::to_string),
        }
    }

    #[test]
    fn test_create_in_memory() {
        let storage = SqliteStorage::new_in_memory();
        assert!(storage.is_ok());
    }

    #[test]
    fn test_create_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", 4).unwrap();
        assert!(run_id > 0);

        let run = storage.get_run(run_id).unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.total_count, 4);
        assert_eq!(run.crawled_count, None);
        assert_eq!(run.finished_at, None);
    }

    #[test]
    fn test_complete_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", 4).unwrap();
        storage.complete_run(run_id, 3).unwrap();

        let run = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(run.id, run_id);
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.crawled_count, Some(3));
        assert!(run.finished_at.is_some());
    }

    #[test]
    fn test_fail_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", 1).unwrap();
        storage.fail_run(run_id).unwrap();
        assert_eq!(storage.get_run(run_id).unwrap().status, RunStatus::Failed);
    }

    #[test]
    fn test_unknown_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(matches!(
            storage.get_run(42),
            Err(StorageError::RunNotFound(42))
        ));
        assert!(matches!(
            storage.complete_run(42, 0),
            Err(StorageError::RunNotFound(42))
        ));
    }

    #[test]
    fn test_corrupt_status_is_an_error() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", 1).unwrap();
        storage
            .conn
            .execute("UPDATE runs SET status = 'paused' WHERE id = ?1", params![run_id])
            .unwrap();

        assert!(matches!(
            storage.get_run(run_id),
            Err(StorageError::Sqlite(rusqlite::Error::FromSqlConversionFailure(4, _, _)))
        ));
        assert!(storage.get_latest_run().is_err());
    }

    #[test]
    fn test_latest_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        assert!(storage.get_latest_run().unwrap().is_none());

        storage.create_run("first", 1).unwrap();
        let second = storage.create_run("second", 2).unwrap();

        let latest = storage.get_latest_run().unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.config_hash, "second");
    }

    #[test]
    fn test_links_keep_order() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", 2).unwrap();

        let links = vec![
            edge("https://ex.com/b", "https://ex.com/c", Some("C")),
            edge("https://ex.com/a", "https://ex.com/c", None),
            edge("https://ex.com/a", "https://ex.com/b", Some("[blogcard]")),
        ];
        storage.save_links(run_id, &links).unwrap();

        assert_eq!(storage.load_links(run_id).unwrap(), links);
        assert_eq!(storage.count_links(run_id).unwrap(), 3);
    }

    #[test]
    fn test_links_are_scoped_to_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let first = storage.create_run("h", 1).unwrap();
        let second = storage.create_run("h", 1).unwrap();

        storage
            .save_links(first, &[edge("https://ex.com/a", "https://ex.com/b", None)])
            .unwrap();

        assert_eq!(storage.load_links(first).unwrap().len(), 1);
        assert!(storage.load_links(second).unwrap().is_empty());
    }

    #[test]
    fn test_errors_roundtrip() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let run_id = storage.create_run("test_hash", 2).unwrap();

        let errors = vec![CrawlError {
            url: "https://ex.com/gone".to_string(),
            error: "HTTP status 404".to_string(),
        }];
        storage.save_errors(run_id, &errors).unwrap();

        assert_eq!(storage.load_errors(run_id).unwrap(), errors);
    }

    #[test]
    fn test_save_links_requires_run() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let result = storage.save_links(99, &[edge("https://ex.com/a", "https://ex.com/b", None)]);
        assert!(matches!(result, Err(StorageError::Sqlite(_))));
    }
}
