//! Stories from the Hacker News API.

use super::{FeedKind, FeedRecord, FetchOutcome, HttpClient, merge_partial};
use crate::config::SocialParams;
use crate::error::FeedError;
use chrono::DateTime;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

/// Item requests kept in flight at once.
const ITEM_CONCURRENCY: usize = 8;

/// A Hacker News story list.
pub struct SocialFeed {
    params: SocialParams,
    http: Arc<dyn HttpClient>,
}

#[derive(Debug, Deserialize)]
struct HnItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: u32,
    #[serde(default)]
    by: Option<String>,
    #[serde(default)]
    descendants: u32,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    dead: bool,
}

/// Parse the story id list, keeping the first `count` ids.
pub fn parse_story_ids(json: &str, count: usize) -> Result<Vec<u64>, FeedError> {
    let ids: Vec<u64> = serde_json::from_str(json)?;
    Ok(ids.into_iter().take(count).collect())
}

/// Parse one item; `None` when the item is missing, deleted, dead or untitled.
pub fn parse_item(json: &str) -> Result<Option<FeedRecord>, FeedError> {
    let item: Option<HnItem> = serde_json::from_str(json)?;
    Ok(item.and_then(convert_item))
}

fn convert_item(item: HnItem) -> Option<FeedRecord> {
    if item.deleted || item.dead {
        return None;
    }
    let title = item.title.filter(|t| !t.trim().is_empty())?;
    let by = item.by.unwrap_or_else(|| "unknown".to_string());
    let posted = DateTime::from_timestamp(item.time, 0)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default();

    let mut record = FeedRecord::new(FeedKind::Social, title.trim())
        .with_detail(format!(
            "▲{} by {} | {} comments | {}",
            item.score, by, item.descendants, posted
        ))
        .with_sort_key(item.time);

    if let Some(host) = item
        .url
        .as_deref()
        .and_then(|u| reqwest::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
    {
        record = record.with_group(host);
    }
    Some(record)
}

impl SocialFeed {
    /// Create a social feed.
    pub fn new(params: SocialParams, http: Arc<dyn HttpClient>) -> Self {
        Self { params, http }
    }

    async fn fetch_item(&self, id: u64) -> Result<Option<FeedRecord>, FeedError> {
        let url = format!("{}/item/{}.json", HN_API_BASE, id);
        let body = self.http.get_text(&url).await?;
        parse_item(&body)
    }

    /// Fetch the story list, then the stories themselves; newest first.
    pub async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        let url = format!("{}/{}stories.json", HN_API_BASE, self.params.story_type);
        let body = self.http.get_text(&url).await?;
        let ids = parse_story_ids(&body, self.params.story_count)?;

        let results: Vec<_> = stream::iter(ids)
            .map(|id| self.fetch_item(id))
            .buffered(ITEM_CONCURRENCY)
            .collect()
            .await;
        let (items, failed) = merge_partial(results)?;

        let mut dropped = failed;
        let mut records = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }
        records.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));

        Ok(FetchOutcome::new(records, dropped))
    }
}
