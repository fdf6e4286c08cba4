//! Directory walker producing file records

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use fsearch_core::{FileRecord, ScanReport, SkippedEntry};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::rules::ScanRules;
use super::{IndexerState, ScanError};

/// At most this many skip reasons are kept in a report
pub const MAX_RECORDED_SKIPS: usize = 100;

/// Records collected by one walk, private to the crawler until published
#[derive(Debug)]
pub struct ScanOutput {
    pub records: Vec<FileRecord>,
    pub report: ScanReport,
}

/// Walk every root and collect one record per regular file.
///
/// Every root is checked before walking starts: an unreachable root fails the
/// whole scan. Errors on individual entries are only counted.
pub fn scan_roots(
    roots: &[PathBuf],
    rules: &ScanRules,
    state: &IndexerState,
) -> Result<ScanOutput, ScanError> {
    let started = Instant::now();
    let started_at = unix_now();

    let roots = resolve_roots(roots)?;
    let mut records = Vec::new();
    let mut report = ScanReport {
        roots: roots
            .iter()
            .map(|r| r.to_string_lossy().into_owned())
            .collect(),
        started_at,
        ..ScanReport::default()
    };

    for root in &roots {
        if state.should_stop() {
            return Err(ScanError::Stopped);
        }
        state.set_current_path(Some(&root.to_string_lossy()));
        info!("Scanning: {:?}", root);
        scan_directory(root, rules, state, started_at, &mut records, &mut report);
    }

    if state.should_stop() {
        return Err(ScanError::Stopped);
    }

    report.files = records.len() as u64;
    report.completed_at = unix_now();
    report.duration_ms = started.elapsed().as_millis() as u64;
    state.set_current_path(None);

    Ok(ScanOutput { records, report })
}

/// Canonicalize roots, failing on the first one that cannot be listed
fn resolve_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    if roots.is_empty() {
        return Err(ScanError::NoRoots);
    }

    roots
        .iter()
        .map(|root| {
            let unreachable = |source| ScanError::RootUnreachable {
                root: root.clone(),
                source,
            };
            let resolved = std::fs::canonicalize(root).map_err(unreachable)?;
            // Listing proves the directory is readable, not only present
            std::fs::read_dir(&resolved).map_err(unreachable)?;
            Ok(resolved)
        })
        .collect()
}

fn scan_directory(
    root: &Path,
    rules: &ScanRules,
    state: &IndexerState,
    started_at: i64,
    records: &mut Vec<FileRecord>,
    report: &mut ScanReport,
) {
    let mut excluded = 0u64;
    let walker = WalkDir::new(root)
        .follow_links(rules.follow_symlinks)
        .into_iter()
        .filter_entry(|e| {
            let keep = e.depth() == 0 || !rules.is_excluded(e.path(), root);
            if !keep {
                excluded += 1;
            }
            keep
        });

    for entry in walker {
        if state.should_stop() {
            break;
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|| root.to_string_lossy().into_owned());
                skip(report, path, e.to_string());
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        // Symlinks only show up here when they are not being followed
        if !file_type.is_file() {
            debug!("Excluding non-regular entry: {:?}", entry.path());
            report.excluded += 1;
            continue;
        }

        let Some(path) = entry.path().to_str() else {
            skip(
                report,
                entry.path().to_string_lossy().into_owned(),
                "path is not valid UTF-8".to_string(),
            );
            continue;
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                skip(report, path.to_string(), e.to_string());
                continue;
            }
        };

        let mtime = metadata.modified().map(to_unix_secs).unwrap_or(0);
        if rules.stability_secs > 0 && started_at - mtime < rules.stability_secs as i64 {
            skip(
                report,
                path.to_string(),
                "unstable: modified within the stability window".to_string(),
            );
            continue;
        }

        records.push(FileRecord::new(path, metadata.len(), mtime));
        state.files_seen.fetch_add(1, Ordering::Relaxed);
    }

    report.excluded += excluded;
}

fn skip(report: &mut ScanReport, path: String, reason: String) {
    debug!("Skipping {}: {}", path, reason);
    report.skipped += 1;
    if report.skipped_entries.len() < MAX_RECORDED_SKIPS {
        report.skipped_entries.push(SkippedEntry { path, reason });
    }
}

fn to_unix_secs(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

pub fn unix_now() -> i64 {
    to_unix_secs(SystemTime::now())
}
