//! Immutable per-feed snapshots.

use crate::error::FeedError;
use crate::feeds::{FeedRecord, FetchOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Freshness of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SnapshotStatus {
    /// No poll has completed yet.
    #[default]
    Loading,
    /// The last poll succeeded.
    Fresh,
    /// The last poll failed; records are from an earlier success.
    Stale { error: String },
    /// Every poll so far has failed; there are no records.
    Failed { error: String },
}

impl std::fmt::Display for SnapshotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading"),
            Self::Fresh => write!(f, "Fresh"),
            Self::Stale { .. } => write!(f, "Stale"),
            Self::Failed { .. } => write!(f, "Failed"),
        }
    }
}

/// The latest normalized result set for one feed.
///
/// Snapshots are never mutated once committed to the cache; every poll
/// produces a replacement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeedSnapshot {
    /// Records in display order.
    pub records: Arc<[FeedRecord]>,
    /// Freshness.
    pub status: SnapshotStatus,
    /// When the displayed records were fetched.
    pub captured_at: Option<DateTime<Utc>>,
    /// When this snapshot was committed.
    pub updated_at: Option<DateTime<Utc>>,
    /// Commit counter, assigned by the cache.
    pub version: u64,
    /// Polls that failed since the last success.
    pub consecutive_failures: u32,
    /// Malformed entries skipped by the poll that produced the records.
    pub dropped: usize,
}

impl FeedSnapshot {
    /// Placeholder shown before the first poll completes.
    pub fn loading() -> Self {
        Self::default()
    }

    /// Snapshot for a successful poll.
    pub fn fresh(outcome: FetchOutcome, now: DateTime<Utc>) -> Self {
        Self {
            records: outcome.records.into(),
            status: SnapshotStatus::Fresh,
            captured_at: Some(now),
            updated_at: Some(now),
            version: 0,
            consecutive_failures: 0,
            dropped: outcome.dropped,
        }
    }

    /// Successor of `self` after a failed poll.
    ///
    /// Records from an earlier success are kept and marked stale; without one
    /// the result is `Failed` with no records.
    pub fn after_failure(&self, err: &FeedError, now: DateTime<Utc>) -> Self {
        let error = err.to_string();
        let status = if self.has_data() {
            SnapshotStatus::Stale { error }
        } else {
            SnapshotStatus::Failed { error }
        };
        Self {
            records: Arc::clone(&self.records),
            status,
            captured_at: self.captured_at,
            updated_at: Some(now),
            version: self.version,
            consecutive_failures: self.consecutive_failures.saturating_add(1),
            dropped: self.dropped,
        }
    }

    /// Whether any poll has ever succeeded.
    pub fn has_data(&self) -> bool {
        self.captured_at.is_some()
    }

    /// The error of the last poll, if it failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            SnapshotStatus::Stale { error } | SnapshotStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}
