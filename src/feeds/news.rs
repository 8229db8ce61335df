//! Headlines from RSS 2.0 feeds.

use super::{FeedKind, FeedRecord, FetchOutcome, HttpClient, merge_partial};
use crate::config::NewsParams;
use crate::error::FeedError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// One or more RSS feeds merged into a single newest-first list.
pub struct NewsFeed {
    params: NewsParams,
    http: Arc<dyn HttpClient>,
}

/// A headline together with the key used for de-duplication.
#[derive(Debug, Clone)]
struct Headline {
    id: String,
    record: FeedRecord,
}

/// Parse an RSS document into headlines, counting malformed items.
///
/// Items without a title, or whose `pubDate` is present but unreadable, are
/// dropped. Undated items are kept and sort after dated ones.
fn parse_headlines(xml: &str) -> Result<(Vec<Headline>, usize), FeedError> {
    let channel =
        rss::Channel::read_from(xml.as_bytes()).map_err(|e| FeedError::parse(e.to_string()))?;
    let source = channel.title().trim().to_string();

    let mut headlines = Vec::with_capacity(channel.items().len());
    let mut dropped = 0usize;

    for item in channel.items() {
        let Some(title) = item.title().map(str::trim).filter(|t| !t.is_empty()) else {
            dropped += 1;
            continue;
        };

        let published = match item.pub_date() {
            Some(raw) => match parse_date(raw) {
                Some(dt) => Some(dt),
                None => {
                    dropped += 1;
                    continue;
                }
            },
            None => None,
        };

        let id = item
            .guid()
            .map(|g| g.value().to_string())
            .or_else(|| item.link().map(String::from))
            .unwrap_or_else(|| title.to_string());

        let detail = match published {
            Some(dt) => format!("{}  {}", dt.format("%b %d %H:%M"), source),
            None => source.clone(),
        };

        let record = FeedRecord::new(FeedKind::News, title)
            .with_detail(detail)
            .with_group(source.clone())
            .with_sort_key(published.map(|dt| dt.timestamp()).unwrap_or(i64::MIN));

        headlines.push(Headline { id, record });
    }

    Ok((headlines, dropped))
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

impl NewsFeed {
    /// Create a news feed.
    pub fn new(params: NewsParams, http: Arc<dyn HttpClient>) -> Self {
        Self { params, http }
    }

    async fn fetch_url(&self, url: &str) -> Result<(Vec<Headline>, usize), FeedError> {
        let body = self.http.get_text(url).await?;
        parse_headlines(&body)
    }

    /// Fetch every configured feed concurrently and merge newest first.
    pub async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        let urls: Vec<&str> = self
            .params
            .urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();

        let results = join_all(urls.iter().map(|u| self.fetch_url(u))).await;
        let (batches, failed) = merge_partial(results)?;

        let mut dropped = failed;
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        for (headlines, malformed) in batches {
            dropped += malformed;
            for headline in headlines {
                if seen.insert(headline.id) {
                    records.push(headline.record);
                }
            }
        }

        // Stable sort keeps feed order among items with equal timestamps.
        records.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        records.truncate(self.params.max_items);

        Ok(FetchOutcome::new(records, dropped))
    }
}
