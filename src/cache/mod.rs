//! Per-feed snapshot cache.
//!
//! The cache is an arena with one cell per configured feed. Each cell wraps a
//! `tokio::sync::watch` channel holding an `Arc<FeedSnapshot>`, so a commit is
//! a pointer swap under that cell's own lock and a read is a pointer clone.
//! Unrelated feeds never contend, and readers only ever see whole snapshots.

mod snapshot;

pub use snapshot::{FeedSnapshot, SnapshotStatus};

use crate::error::FeedError;
use crate::feeds::FetchOutcome;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

struct FeedCell {
    tx: watch::Sender<Arc<FeedSnapshot>>,
    in_flight: AtomicBool,
    /// Only read or written while holding the watch lock.
    sealed: AtomicBool,
}

impl FeedCell {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(FeedSnapshot::loading()));
        Self {
            tx,
            in_flight: AtomicBool::new(false),
            sealed: AtomicBool::new(false),
        }
    }

    /// Replace the snapshot with `f(current)`, assigning the next version.
    fn commit(&self, f: impl FnOnce(&FeedSnapshot) -> FeedSnapshot) -> bool {
        self.tx.send_if_modified(|current| {
            if self.sealed.load(Ordering::SeqCst) {
                return false;
            }
            let mut next = f(current);
            next.version = current.version + 1;
            *current = Arc::new(next);
            true
        })
    }
}

/// Marks a feed as having a poll in flight; cleared on drop.
pub struct PollGuard {
    cell: Arc<FeedCell>,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.cell.in_flight.store(false, Ordering::Release);
    }
}

/// Shared handle to the snapshot arena.
#[derive(Clone)]
pub struct FeedCache {
    cells: Arc<HashMap<String, Arc<FeedCell>>>,
}

impl FeedCache {
    /// Create a cache with a `Loading` placeholder for every feed id.
    pub fn new<I, S>(feed_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = feed_ids
            .into_iter()
            .map(|id| (id.into(), Arc::new(FeedCell::new())))
            .collect();
        Self {
            cells: Arc::new(cells),
        }
    }

    /// The last committed snapshot for `feed_id`.
    pub fn get(&self, feed_id: &str) -> Option<Arc<FeedSnapshot>> {
        self.cells
            .get(feed_id)
            .map(|cell| Arc::clone(&cell.tx.borrow()))
    }

    /// Atomically replace the snapshot for `feed_id`.
    ///
    /// Returns `false` when the feed is unknown or the cache is sealed. The
    /// stored version is assigned by the cache.
    pub fn set(&self, feed_id: &str, snapshot: FeedSnapshot) -> bool {
        match self.cells.get(feed_id) {
            Some(cell) => cell.commit(|_| snapshot),
            None => false,
        }
    }

    /// Commit a successful poll.
    pub fn record_success(&self, feed_id: &str, outcome: FetchOutcome) -> bool {
        let now = Utc::now();
        self.set(feed_id, FeedSnapshot::fresh(outcome, now))
    }

    /// Commit a failed poll, keeping the last successful records if any.
    pub fn record_failure(&self, feed_id: &str, err: &FeedError) -> bool {
        let now = Utc::now();
        match self.cells.get(feed_id) {
            Some(cell) => cell.commit(|current| current.after_failure(err, now)),
            None => false,
        }
    }

    /// Claim the in-flight slot for `feed_id`.
    ///
    /// Returns `None` when a poll for the feed is already running.
    pub fn try_begin_poll(&self, feed_id: &str) -> Option<PollGuard> {
        let cell = self.cells.get(feed_id)?;
        cell.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PollGuard {
                cell: Arc::clone(cell),
            })
    }

    /// Whether a poll for `feed_id` is running.
    pub fn is_polling(&self, feed_id: &str) -> bool {
        self.cells
            .get(feed_id)
            .is_some_and(|cell| cell.in_flight.load(Ordering::Acquire))
    }

    /// Watch commits to `feed_id`.
    pub fn subscribe(&self, feed_id: &str) -> Option<watch::Receiver<Arc<FeedSnapshot>>> {
        self.cells.get(feed_id).map(|cell| cell.tx.subscribe())
    }

    /// Reject every later write.
    ///
    /// A commit racing with `seal` either completes before it returns or is
    /// discarded.
    pub fn seal(&self) {
        for cell in self.cells.values() {
            cell.tx.send_if_modified(|_| {
                cell.sealed.store(true, Ordering::SeqCst);
                false
            });
        }
    }

    /// Whether [`seal`](Self::seal) has been called.
    pub fn is_sealed(&self) -> bool {
        self.cells
            .values()
            .any(|cell| cell.sealed.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::{FeedKind, FeedRecord};
    use pretty_assertions::assert_eq;

    fn outcome(n: usize) -> FetchOutcome {
        FetchOutcome::new(
            (0..n)
                .map(|i| FeedRecord::new(FeedKind::Stocks, format!("r{}", i)).with_sort_key(i as i64))
                .collect(),
            0,
        )
    }

    #[test]
    fn test_initial_snapshot_is_loading() {
        let cache = FeedCache::new(["stocks", "news"]);
        let snap = cache.get("stocks").unwrap();
        assert_eq!(snap.status, SnapshotStatus::Loading);
        assert_eq!(snap.version, 0);
        assert!(cache.get("weather").is_none());
    }

    #[test]
    fn test_set_assigns_versions() {
        let cache = FeedCache::new(["stocks"]);
        assert!(cache.record_success("stocks", outcome(2)));
        assert!(cache.record_failure("stocks", &FeedError::network("down")));

        let snap = cache.get("stocks").unwrap();
        assert_eq!(snap.version, 2);
        assert_eq!(snap.records.len(), 2);
        assert!(matches!(snap.status, SnapshotStatus::Stale { .. }));
        assert!(!cache.set("weather", FeedSnapshot::loading()));
    }

    #[test]
    fn test_feeds_are_independent() {
        let cache = FeedCache::new(["stocks", "news"]);
        cache.record_success("stocks", outcome(1));
        assert_eq!(cache.get("news").unwrap().version, 0);
        assert_eq!(cache.get("stocks").unwrap().version, 1);
    }

    #[test]
    fn test_poll_guard_is_exclusive() {
        let cache = FeedCache::new(["stocks", "news"]);
        let guard = cache.try_begin_poll("stocks").unwrap();
        assert!(cache.is_polling("stocks"));
        assert!(cache.try_begin_poll("stocks").is_none());
        assert!(cache.try_begin_poll("news").is_some());

        drop(guard);
        assert!(!cache.is_polling("stocks"));
        assert!(cache.try_begin_poll("stocks").is_some());
    }

    #[test]
    fn test_sealed_cache_rejects_writes() {
        let cache = FeedCache::new(["stocks"]);
        cache.record_success("stocks", outcome(1));
        cache.seal();

        assert!(cache.is_sealed());
        assert!(!cache.record_success("stocks", outcome(3)));
        assert!(!cache.record_failure("stocks", &FeedError::network("x")));
        let snap = cache.get("stocks").unwrap();
        assert_eq!(snap.version, 1);
        assert_eq!(snap.records.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let cache = FeedCache::new(["news"]);
        let mut rx = cache.subscribe("news").unwrap();
        cache.record_success("news", outcome(4));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().records.len(), 4);
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_snapshots() {
        let cache = FeedCache::new(["stocks"]);
        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for n in 1..=500usize {
                    cache.record_success("stocks", outcome(n));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let mut last_version = 0;
                    for _ in 0..2_000 {
                        let snap = cache.get("stocks").unwrap();
                        // Version n always carries exactly n records numbered 0..n.
                        assert_eq!(snap.records.len() as u64, snap.version);
                        for (i, record) in snap.records.iter().enumerate() {
                            assert_eq!(record.sort_key, i as i64);
                        }
                        assert!(snap.version >= last_version);
                        last_version = snap.version;
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(cache.get("stocks").unwrap().version, 500);
    }
}
