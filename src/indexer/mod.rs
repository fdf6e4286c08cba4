//! File indexing module
//!
//! Handles directory scanning and snapshot publication. At most one scan runs
//! at a time; the walk itself happens on a blocking thread and its records
//! stay private until the finished snapshot is published.

mod rules;
mod scanner;

pub use rules::ScanRules;
pub use scanner::{MAX_RECORDED_SKIPS, ScanOutput, scan_roots, unix_now};

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use fsearch_core::ScanReport;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::IndexConfig;
use crate::database::Database;
use crate::index::{IndexService, IndexSnapshot};

/// Scan-level failures; the previously published snapshot stays active
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("No scan roots configured")]
    NoRoots,

    #[error("Scan root {root:?} is unreachable: {source}")]
    RootUnreachable {
        root: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A scan is already running")]
    AlreadyRunning,

    #[error("Scan stopped by request")]
    Stopped,

    #[error("Scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Shared indexer state
#[derive(Clone)]
pub struct Indexer {
    index: IndexService,
    db: Option<Database>,
    config: Arc<IndexConfig>,
    state: Arc<IndexerState>,
}

/// Indexer runtime state
#[derive(Default)]
pub struct IndexerState {
    pub is_scanning: AtomicBool,
    pub files_seen: AtomicU64,
    pub current_scan_path: RwLock<Option<String>>,
    pub last_report: RwLock<Option<ScanReport>>,
    pub should_stop: AtomicBool,
}

impl IndexerState {
    fn set_current_path(&self, path: Option<&str>) {
        *self.current_scan_path.write() = path.map(str::to_string);
    }

    fn should_stop(&self) -> bool {
        self.should_stop.load(Ordering::Relaxed)
    }
}

/// Proof that the caller owns the single scan slot; releases it on drop
pub struct ScanGuard {
    state: Arc<IndexerState>,
}

impl Drop for ScanGuard {
    fn drop(&mut self) {
        self.state.is_scanning.store(false, Ordering::SeqCst);
    }
}

impl Indexer {
    /// Create a new indexer
    pub fn new(index: IndexService, db: Option<Database>, config: IndexConfig) -> Self {
        Self {
            index,
            db,
            config: Arc::new(config),
            state: Arc::new(IndexerState::default()),
        }
    }

    /// Check if currently scanning
    pub fn is_scanning(&self) -> bool {
        self.state.is_scanning.load(Ordering::SeqCst)
    }

    /// Files recorded so far by the running (or last) scan
    pub fn files_seen(&self) -> u64 {
        self.state.files_seen.load(Ordering::Relaxed)
    }

    /// Get current scan path
    pub fn get_current_scan_path(&self) -> Option<String> {
        self.state.current_scan_path.read().clone()
    }

    /// Report of the last successful scan
    pub fn last_report(&self) -> Option<ScanReport> {
        self.state.last_report.read().clone()
    }

    /// Roots of the last successful scan, else the configured roots resolved
    /// the same way a scan would resolve them
    pub fn root_names(&self) -> Vec<String> {
        if let Some(report) = self.state.last_report.read().as_ref() {
            return report.roots.clone();
        }
        self.config
            .roots
            .iter()
            .map(|root| match std::fs::canonicalize(root) {
                Ok(resolved) => resolved.to_string_lossy().into_owned(),
                Err(_) => root.clone(),
            })
            .collect()
    }

    /// Request stop
    pub fn request_stop(&self) {
        self.state.should_stop.store(true, Ordering::Relaxed);
    }

    /// Claim the scan slot, failing if a scan is in flight
    pub fn try_begin(&self) -> Result<ScanGuard, ScanError> {
        self.state
            .is_scanning
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| ScanError::AlreadyRunning)?;
        Ok(ScanGuard {
            state: self.state.clone(),
        })
    }

    /// Run a full scan and publish the result
    pub async fn scan(&self) -> Result<ScanReport, ScanError> {
        let guard = self.try_begin()?;
        self.run_scan(guard).await
    }

    /// Start a scan in the background; errors only if one is already running
    pub fn request_scan(&self) -> Result<(), ScanError> {
        let guard = self.try_begin()?;
        let indexer = self.clone();
        tokio::spawn(async move {
            if let Err(e) = indexer.run_scan(guard).await {
                error!("Scan failed: {}", e);
            }
        });
        Ok(())
    }

    async fn run_scan(&self, _guard: ScanGuard) -> Result<ScanReport, ScanError> {
        let roots: Vec<PathBuf> = self.config.roots.iter().map(PathBuf::from).collect();
        let rules = ScanRules::from_config(&self.config);
        let state = self.state.clone();

        state.files_seen.store(0, Ordering::Relaxed);
        info!("Starting scan of {} roots", roots.len());

        let result =
            tokio::task::spawn_blocking(move || scan_roots(&roots, &rules, &state)).await?;
        let ScanOutput { records, report } = match result {
            Ok(output) => output,
            Err(e) => {
                warn!("Scan aborted, keeping previous snapshot: {}", e);
                return Err(e);
            }
        };

        let snapshot = Arc::new(IndexSnapshot::new(
            records,
            report.started_at,
            report.completed_at,
        ));
        self.index.publish(snapshot.clone());
        self.persist(snapshot).await;

        let seconds = report.duration_ms as f64 / 1000.0;
        info!(
            "Scan complete: {} files, {} skipped, {} excluded in {:.2}s ({:.0} files/sec)",
            report.files,
            report.skipped,
            report.excluded,
            seconds,
            if seconds > 0.0 {
                report.files as f64 / seconds
            } else {
                report.files as f64
            }
        );

        *self.state.last_report.write() = Some(report.clone());
        Ok(report)
    }

    /// Write the published snapshot to the database.
    /// A failed write is logged; the in-memory snapshot stays authoritative.
    async fn persist(&self, snapshot: Arc<IndexSnapshot>) {
        let Some(db) = self.db.clone() else {
            return;
        };

        match tokio::task::spawn_blocking(move || db.save_snapshot(&snapshot)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed to persist snapshot: {:#}", e),
            Err(e) => error!("Persist task failed: {}", e),
        }
    }

    /// Rescan every `interval` until stopped
    pub fn spawn_rescan_timer(&self, interval: Duration) -> tokio::task::JoinHandle<()> {
        let indexer = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; startup scans are separate
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if indexer.state.should_stop() {
                    info!("Rescan timer stopping by request");
                    break;
                }

                match indexer.scan().await {
                    Ok(_) => {}
                    Err(ScanError::AlreadyRunning) => {
                        debug!("Skipping timed rescan, a scan is already running");
                    }
                    Err(e) => warn!("Timed rescan failed: {}", e),
                }
            }
        })
    }

    /// Get index reference
    pub fn index(&self) -> &IndexService {
        &self.index
    }
}
