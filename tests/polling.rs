//! Scheduler and cache working together against a scripted upstream.

use async_trait::async_trait;
use feedtui::feeds::HttpClient;
use feedtui::{Config, FeedCache, FeedError, PollScheduler, SnapshotStatus};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const CONFIG: &str = r#"
[general]
layout = ["stocks", "news"]
refresh_floor_secs = 1

[feeds.stocks]
kind = "stocks"
refresh_secs = 30
symbols = ["AAPL"]

[feeds.news]
kind = "news"
refresh_secs = 60
urls = ["https://news.example.com/rss"]
"#;

const CHART: &str = r#"{"chart":{"result":[{"meta":{"symbol":"AAPL","shortName":"Apple Inc.","regularMarketPrice":190.5,"chartPreviousClose":188.0}}],"error":null}}"#;

/// Ten items, one without a title and one with an unreadable date.
fn news_body() -> String {
    let mut items = String::new();
    for i in 0..8 {
        items.push_str(&format!(
            "<item><title>Story {i}</title><guid>s{i}</guid><pubDate>Tue, 02 Jan 2024 0{i}:00:00 +0000</pubDate></item>"
        ));
    }
    items.push_str("<item><guid>blank</guid></item>");
    items.push_str("<item><title>Bad date</title><guid>bad</guid><pubDate>someday</pubDate></item>");
    format!(
        r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Example News</title><link>https://news.example.com</link><description>all the news</description>{items}</channel></rss>"#
    )
}

struct ScriptedUpstream {
    stocks_up: AtomicBool,
    stock_calls: AtomicUsize,
    news_calls: AtomicUsize,
}

impl ScriptedUpstream {
    fn new() -> Self {
        Self {
            stocks_up: AtomicBool::new(false),
            stock_calls: AtomicUsize::new(0),
            news_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl HttpClient for ScriptedUpstream {
    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        if url.contains("finance.yahoo.com") {
            self.stock_calls.fetch_add(1, Ordering::SeqCst);
            if self.stocks_up.load(Ordering::SeqCst) {
                Ok(CHART.to_string())
            } else {
                Err(FeedError::network("connection refused"))
            }
        } else {
            self.news_calls.fetch_add(1, Ordering::SeqCst);
            Ok(news_body())
        }
    }
}

fn setup() -> (Config, FeedCache, Arc<ScriptedUpstream>) {
    let config = Config::from_toml(CONFIG).expect("valid TOML");
    tokio_test::assert_ok!(config.validate());
    let cache = FeedCache::new(config.enabled_feeds().map(|(id, _)| id.clone()));
    (config, cache, Arc::new(ScriptedUpstream::new()))
}

#[tokio::test(start_paused = true)]
async fn test_feeds_fail_recover_and_go_stale_independently() {
    let (config, cache, upstream) = setup();
    let token = CancellationToken::new();
    let mut scheduler = PollScheduler::new(&config, cache.clone(), upstream.clone(), token);
    scheduler.start();

    tokio::time::sleep(Duration::from_secs(1)).await;

    let news = cache.get("news").unwrap();
    assert_eq!(news.status, SnapshotStatus::Fresh);
    assert_eq!(news.records.len(), 8);
    assert_eq!(news.dropped, 2);
    assert_eq!(news.records[0].title, "Story 7");

    let stocks = cache.get("stocks").unwrap();
    assert!(matches!(stocks.status, SnapshotStatus::Failed { .. }));
    assert!(stocks.records.is_empty());
    assert_eq!(stocks.captured_at, None);

    // First retry comes after twice the nominal interval.
    upstream.stocks_up.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_secs(55)).await;
    assert_eq!(upstream.stock_calls.load(Ordering::SeqCst), 1);
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(upstream.stock_calls.load(Ordering::SeqCst), 2);

    let stocks = cache.get("stocks").unwrap();
    assert_eq!(stocks.status, SnapshotStatus::Fresh);
    assert_eq!(stocks.consecutive_failures, 0);
    assert!(stocks.records[0].title.starts_with("AAPL"));
    let captured = stocks.captured_at;

    // A later failure keeps the quote on screen.
    upstream.stocks_up.store(false, Ordering::SeqCst);
    scheduler.refresh_all();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let stocks = cache.get("stocks").unwrap();
    assert!(matches!(stocks.status, SnapshotStatus::Stale { .. }));
    assert_eq!(stocks.records.len(), 1);
    assert_eq!(stocks.captured_at, captured);
    assert_eq!(stocks.error(), Some("network error: connection refused"));

    // News kept its own schedule throughout.
    assert!(upstream.news_calls.load(Ordering::SeqCst) >= 2);
    assert_eq!(cache.get("news").unwrap().status, SnapshotStatus::Fresh);

    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_external_cancellation_stops_polling() {
    let (config, cache, upstream) = setup();
    let token = CancellationToken::new();
    let mut scheduler = PollScheduler::new(&config, cache.clone(), upstream.clone(), token.clone());
    scheduler.start();
    tokio::time::sleep(Duration::from_secs(1)).await;

    token.cancel();
    scheduler.shutdown().await;
    assert!(cache.is_sealed());

    let calls = upstream.news_calls.load(Ordering::SeqCst);
    let version = cache.get("news").unwrap().version;
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(upstream.news_calls.load(Ordering::SeqCst), calls);
    assert_eq!(cache.get("news").unwrap().version, version);
}
