//! Feed sources.
//!
//! The set of feed kinds is closed: [`FeedSource`] is an enum over the four
//! variants and dispatches `fetch` with a `match`. Each variant turns one
//! upstream API into normalized [`FeedRecord`]s and tolerates malformed
//! entries by dropping and counting them.

pub mod http;
pub mod news;
pub mod social;
pub mod sports;
pub mod stocks;

pub use http::{HttpClient, ReqwestClient};
pub use news::NewsFeed;
pub use social::SocialFeed;
pub use sports::SportsFeed;
pub use stocks::StocksFeed;

use crate::config::FeedParams;
use crate::error::FeedError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The kind of upstream a feed talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeedKind {
    Stocks,
    News,
    Sports,
    Social,
}

impl std::fmt::Display for FeedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stocks => write!(f, "Stocks"),
            Self::News => write!(f, "News"),
            Self::Sports => write!(f, "Sports"),
            Self::Social => write!(f, "Social"),
        }
    }
}

/// Direction hint used to color a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
    Flat,
    #[default]
    None,
}

/// A normalized, displayable unit of feed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedRecord {
    /// Source kind.
    pub kind: FeedKind,
    /// Primary display line.
    pub title: String,
    /// Secondary display line.
    pub detail: Option<String>,
    /// Grouping label (league, publication).
    pub group: Option<String>,
    /// Coloring hint.
    pub trend: Trend,
    /// Ordering key assigned by the source.
    pub sort_key: i64,
}

impl FeedRecord {
    /// Create a record with only a title.
    pub fn new(kind: FeedKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: None,
            group: None,
            trend: Trend::None,
            sort_key: 0,
        }
    }

    /// Set the detail line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Set the group label.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Set the trend.
    pub fn with_trend(mut self, trend: Trend) -> Self {
        self.trend = trend;
        self
    }

    /// Set the sort key.
    pub fn with_sort_key(mut self, key: i64) -> Self {
        self.sort_key = key;
        self
    }
}

/// Result of one successful fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Normalized records in display order.
    pub records: Vec<FeedRecord>,
    /// Malformed entries (or failed sub-requests) that were skipped.
    pub dropped: usize,
}

impl FetchOutcome {
    /// Create an outcome.
    pub fn new(records: Vec<FeedRecord>, dropped: usize) -> Self {
        Self { records, dropped }
    }
}

/// A configured feed source.
pub enum FeedSource {
    Stocks(StocksFeed),
    News(NewsFeed),
    Sports(SportsFeed),
    Social(SocialFeed),
}

impl FeedSource {
    /// Build the source for the given parameters.
    pub fn from_params(params: &FeedParams, http: Arc<dyn HttpClient>) -> Self {
        match params {
            FeedParams::Stocks(p) => Self::Stocks(StocksFeed::new(p.clone(), http)),
            FeedParams::News(p) => Self::News(NewsFeed::new(p.clone(), http)),
            FeedParams::Sports(p) => Self::Sports(SportsFeed::new(p.clone(), http)),
            FeedParams::Social(p) => Self::Social(SocialFeed::new(p.clone(), http)),
        }
    }

    /// The kind of this source.
    pub fn kind(&self) -> FeedKind {
        match self {
            Self::Stocks(_) => FeedKind::Stocks,
            Self::News(_) => FeedKind::News,
            Self::Sports(_) => FeedKind::Sports,
            Self::Social(_) => FeedKind::Social,
        }
    }

    /// Fetch and normalize the latest records.
    pub async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        match self {
            Self::Stocks(feed) => feed.fetch().await,
            Self::News(feed) => feed.fetch().await,
            Self::Sports(feed) => feed.fetch().await,
            Self::Social(feed) => feed.fetch().await,
        }
    }
}

/// Combine the results of several sub-requests into one fetch result.
///
/// Failed sub-requests count as dropped as long as at least one succeeded.
/// When all of them failed, the most severe error is reported.
pub(crate) fn merge_partial<T>(
    results: Vec<Result<T, FeedError>>,
) -> Result<(Vec<T>, usize), FeedError> {
    let mut ok = Vec::with_capacity(results.len());
    let mut worst: Option<FeedError> = None;
    let mut failed = 0usize;

    for result in results {
        match result {
            Ok(value) => ok.push(value),
            Err(err) => {
                failed += 1;
                tracing::debug!("sub-request failed: {}", err);
                if worst.as_ref().is_none_or(|w| err.severity() > w.severity()) {
                    worst = Some(err);
                }
            }
        }
    }

    match worst {
        Some(err) if ok.is_empty() => Err(err),
        _ => Ok((ok, failed)),
    }
}
