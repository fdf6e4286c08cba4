//! Holder of the published snapshot

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fsearch_core::IndexStats;
use parking_lot::RwLock;
use tracing::info;

use super::IndexSnapshot;

/// Shared handle to the active snapshot.
///
/// Readers take an `Arc` clone under a read lock and drop the lock before
/// doing any work, so a publish only ever waits for that clone.
#[derive(Clone)]
pub struct IndexService {
    inner: Arc<IndexServiceInner>,
}

struct IndexServiceInner {
    current: RwLock<Arc<IndexSnapshot>>,
    generation: AtomicU64,
}

impl IndexService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(IndexServiceInner {
                current: RwLock::new(Arc::new(IndexSnapshot::empty())),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Active snapshot; the empty snapshot until the first publish
    pub fn current(&self) -> Arc<IndexSnapshot> {
        self.inner.current.read().clone()
    }

    /// Replace the active snapshot, returning the one it superseded.
    pub fn publish(&self, snapshot: impl Into<Arc<IndexSnapshot>>) -> Arc<IndexSnapshot> {
        let snapshot = snapshot.into();
        let total_files = snapshot.total_files();
        let previous = std::mem::replace(&mut *self.inner.current.write(), snapshot);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "Published snapshot #{} with {} files (previous had {})",
            generation,
            total_files,
            previous.total_files()
        );
        previous
    }

    pub fn stats(&self) -> IndexStats {
        self.current().stats()
    }

    /// Number of snapshots published since start
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// True once any snapshot, persisted or scanned, has been published
    pub fn is_indexed(&self) -> bool {
        self.generation() > 0
    }
}

impl Default for IndexService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsearch_core::FileRecord;

    fn snapshot_of(paths: &[&str], completed_at: i64) -> IndexSnapshot {
        let records = paths.iter().map(|p| FileRecord::new(*p, 1, 0)).collect();
        IndexSnapshot::new(records, completed_at - 1, completed_at)
    }

    #[test]
    fn starts_empty() {
        let service = IndexService::new();
        assert_eq!(service.current().total_files(), 0);
        assert_eq!(service.stats().last_scan, None);
        assert!(!service.is_indexed());
    }

    #[test]
    fn held_snapshot_survives_publish() {
        let service = IndexService::new();
        service.publish(snapshot_of(&["/a/1", "/a/2"], 100));

        let held = service.current();
        let previous = service.publish(snapshot_of(&["/b/1"], 200));

        assert!(Arc::ptr_eq(&held, &previous));
        assert_eq!(held.total_files(), 2);
        assert_eq!(held.last_scan(), Some(100));
        assert_eq!(service.current().total_files(), 1);
        assert_eq!(service.stats().last_scan, Some(200));
        assert_eq!(service.generation(), 2);
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        let service = IndexService::new();
        let old: Vec<String> = (0..500).map(|i| format!("/old/{i:04}")).collect();
        let new: Vec<String> = (0..300).map(|i| format!("/new/{i:04}")).collect();
        let old_refs: Vec<&str> = old.iter().map(String::as_str).collect();
        service.publish(snapshot_of(&old_refs, 1));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let service = service.clone();
                scope.spawn(move || {
                    for _ in 0..200 {
                        let snapshot = service.current();
                        let records = snapshot.records();
                        let all_old = records.iter().all(|r| r.path.starts_with("/old/"));
                        let all_new = records.iter().all(|r| r.path.starts_with("/new/"));
                        assert!(all_old || all_new);
                        assert!(records.len() == 500 || records.len() == 300);
                    }
                });
            }

            let new_refs: Vec<&str> = new.iter().map(String::as_str).collect();
            service.publish(snapshot_of(&new_refs, 2));
        });

        assert_eq!(service.current().total_files(), 300);
    }
}
