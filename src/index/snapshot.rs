//! Immutable point-in-time record sets

use std::collections::HashMap;
use std::path::Path;

use fsearch_core::{FileRecord, IndexStats, RootStats};

/// A published set of file records plus the scan that produced it.
///
/// Records are held sorted by path and deduplicated. Nothing hands out
/// mutable access, so once an `IndexSnapshot` is behind an `Arc` it never
/// changes.
#[derive(Debug, Default)]
pub struct IndexSnapshot {
    records: Vec<FileRecord>,
    total_size: u64,
    scan_started_at: Option<i64>,
    scan_completed_at: Option<i64>,
}

impl IndexSnapshot {
    /// The snapshot served before any scan has completed
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(mut records: Vec<FileRecord>, scan_started_at: i64, scan_completed_at: i64) -> Self {
        records.sort_unstable_by(|a, b| a.path.cmp(&b.path));
        records.dedup_by(|a, b| a.path == b.path);
        let total_size = records.iter().map(|r| r.size).sum();

        Self {
            records,
            total_size,
            scan_started_at: Some(scan_started_at),
            scan_completed_at: Some(scan_completed_at),
        }
    }

    /// Records in ascending path order
    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn total_files(&self) -> usize {
        self.records.len()
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn scan_started_at(&self) -> Option<i64> {
        self.scan_started_at
    }

    /// Completion time of the producing scan, `None` for the empty snapshot
    pub fn last_scan(&self) -> Option<i64> {
        self.scan_completed_at
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_files: self.records.len() as u64,
            total_size: self.total_size,
            last_scan: self.scan_completed_at,
        }
    }

    /// Files and bytes per root, in the order given.
    ///
    /// A record counts under the longest root containing it, so nested roots
    /// are not double counted. Records under no root are left out.
    pub fn root_stats(&self, roots: &[String]) -> Vec<RootStats> {
        let mut stats: Vec<RootStats> = roots
            .iter()
            .map(|root| RootStats {
                name: root.clone(),
                ..RootStats::default()
            })
            .collect();

        for record in &self.records {
            let path = Path::new(&record.path);
            let owner = stats
                .iter_mut()
                .filter(|s| path.starts_with(&s.name))
                .max_by_key(|s| s.name.len());
            if let Some(owner) = owner {
                owner.files += 1;
                owner.size += record.size;
            }
        }
        stats
    }

    /// Most common non-empty extensions, by count then name
    pub fn extension_counts(&self, limit: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            if !record.extension.is_empty() {
                *counts.entry(record.extension.as_str()).or_default() += 1;
            }
        }

        let mut counts: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(ext, count)| (ext.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        counts
    }
}
