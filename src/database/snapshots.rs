//! Snapshot persistence
//! A snapshot is written in a single transaction so a crash mid-write leaves
//! the previous snapshot intact.

use anyhow::{Context, Result};
use fsearch_core::FileRecord;
use rusqlite::{OptionalExtension, params};
use tracing::info;

use super::Database;
use crate::index::IndexSnapshot;

const META_SCAN_STARTED: &str = "scan_started_at";
const META_SCAN_COMPLETED: &str = "scan_completed_at";

impl Database {
    /// Replace the stored snapshot with `snapshot`
    pub fn save_snapshot(&self, snapshot: &IndexSnapshot) -> Result<()> {
        let start = std::time::Instant::now();
        let mut conn = self.connection();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM files", [])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO files (path, basename, dirpath, ext, size, mtime)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )?;

            for record in snapshot.records() {
                stmt.execute(params![
                    record.path,
                    record.basename,
                    record.dirpath,
                    record.extension,
                    record.size as i64,
                    record.mtime,
                ])?;
            }
        }

        {
            let mut meta = tx.prepare(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )?;
            if let Some(started) = snapshot.scan_started_at() {
                meta.execute(params![META_SCAN_STARTED, started])?;
            }
            if let Some(completed) = snapshot.last_scan() {
                meta.execute(params![META_SCAN_COMPLETED, completed])?;
            }
        }

        tx.commit().context("Failed to commit snapshot")?;

        info!(
            "Persisted {} records in {}ms",
            snapshot.total_files(),
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Load the stored snapshot, `None` if no scan was ever persisted
    pub fn load_snapshot(&self) -> Result<Option<IndexSnapshot>> {
        let conn = self.connection();

        let read_meta = |key: &str| -> rusqlite::Result<Option<i64>> {
            conn.query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
        };

        let Some(completed) = read_meta(META_SCAN_COMPLETED)? else {
            return Ok(None);
        };
        let started = read_meta(META_SCAN_STARTED)?.unwrap_or(completed);

        let mut stmt = conn.prepare(
            "SELECT path, basename, dirpath, ext, size, mtime FROM files ORDER BY path",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(FileRecord {
                    path: row.get(0)?,
                    basename: row.get(1)?,
                    dirpath: row.get(2)?,
                    extension: row.get(3)?,
                    size: row.get::<_, i64>(4)?.max(0) as u64,
                    mtime: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(IndexSnapshot::new(records, started, completed)))
    }

    /// Stats of the stored snapshot without loading its records
    pub fn stored_stats(&self) -> Result<fsearch_core::IndexStats> {
        let conn = self.connection();

        let (total_files, total_size): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM files",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let last_scan: Option<i64> = conn
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![META_SCAN_COMPLETED],
                |row| row.get(0),
            )
            .optional()?;

        Ok(fsearch_core::IndexStats {
            total_files: total_files.max(0) as u64,
            total_size: total_size.max(0) as u64,
            last_scan,
        })
    }
}
