//! Stock quotes from the Yahoo Finance chart endpoint.

use super::{FeedKind, FeedRecord, FetchOutcome, HttpClient, Trend, merge_partial};
use crate::config::StocksParams;
use crate::error::FeedError;
use futures::future::join_all;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

const CHART_API_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Watch-list of ticker symbols.
pub struct StocksFeed {
    params: StocksParams,
    http: Arc<dyn HttpClient>,
}

/// One normalized quote.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}

impl Quote {
    fn trend(&self) -> Trend {
        if self.change.is_zero() {
            Trend::Flat
        } else if self.change.is_sign_negative() {
            Trend::Down
        } else {
            Trend::Up
        }
    }

    fn into_record(self, position: usize) -> FeedRecord {
        let sign = if self.change.is_sign_negative() { "" } else { "+" };
        let trend = self.trend();
        FeedRecord::new(
            FeedKind::Stocks,
            format!("{:<8}{:>12}", self.symbol, format!("{:.2}", self.price)),
        )
        .with_detail(format!(
            "{}{:.2} ({}{:.2}%)  {}",
            sign, self.change, sign, self.change_percent, self.name
        ))
        .with_trend(trend)
        .with_sort_key(position as i64)
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    symbol: String,
    short_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
}

/// Parse one chart response into a quote.
pub fn parse_chart(json: &str) -> Result<Quote, FeedError> {
    let response: ChartResponse = serde_json::from_str(json)?;
    let meta = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .map(|r| r.meta)
        .ok_or_else(|| FeedError::parse("chart response has no result"))?;

    let price = meta
        .regular_market_price
        .and_then(|p| Decimal::try_from(p).ok())
        .ok_or_else(|| FeedError::parse(format!("{} has no market price", meta.symbol)))?;
    let prev_close = meta
        .chart_previous_close
        .and_then(|p| Decimal::try_from(p).ok())
        .unwrap_or(price);

    let out_of_range = || FeedError::parse(format!("{} quote is out of range", meta.symbol));
    let change = price.checked_sub(prev_close).ok_or_else(out_of_range)?;
    let change_percent = if prev_close.is_zero() {
        Decimal::ZERO
    } else {
        change
            .checked_div(prev_close)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .ok_or_else(out_of_range)?
    };

    Ok(Quote {
        name: meta.short_name.unwrap_or_else(|| meta.symbol.clone()),
        symbol: meta.symbol,
        price,
        change,
        change_percent,
    })
}

impl StocksFeed {
    /// Create a stocks feed.
    pub fn new(params: StocksParams, http: Arc<dyn HttpClient>) -> Self {
        Self { params, http }
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Quote, FeedError> {
        let url = format!("{}/{}?interval=1d&range=1d", CHART_API_BASE, symbol);
        let body = self.http.get_text(&url).await?;
        parse_chart(&body)
    }

    /// Fetch every symbol concurrently; records keep watch-list order.
    pub async fn fetch(&self) -> Result<FetchOutcome, FeedError> {
        let symbols: Vec<&str> = self
            .params
            .symbols
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();

        let results = join_all(symbols.iter().map(|s| self.fetch_symbol(s))).await;
        let (quotes, dropped) = merge_partial(results)?;

        let records = quotes
            .into_iter()
            .enumerate()
            .map(|(i, q)| q.into_record(i))
            .collect();
        Ok(FetchOutcome::new(records, dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::http::MockHttpClient;
    use rust_decimal_macros::dec;

    fn chart_json(symbol: &str, price: f64, prev: f64) -> String {
        format!(
            r#"{{"chart":{{"result":[{{"meta":{{"symbol":"{}","shortName":"{} Inc.","regularMarketPrice":{},"chartPreviousClose":{}}}}}],"error":null}}}}"#,
            symbol, symbol, price, prev
        )
    }

    #[test]
    fn test_parse_chart() {
        let quote = parse_chart(&chart_json("AAPL", 110.0, 100.0)).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name, "AAPL Inc.");
        assert_eq!(quote.price, dec!(110));
        assert_eq!(quote.change, dec!(10));
        assert_eq!(quote.change_percent, dec!(10));
        assert_eq!(quote.trend(), Trend::Up);
    }

    #[test]
    fn test_parse_chart_without_result() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found"}}}"#;
        assert!(matches!(parse_chart(json), Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_parse_chart_without_price() {
        let json = r#"{"chart":{"result":[{"meta":{"symbol":"X"}}]}}"#;
        assert!(matches!(parse_chart(json), Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_parse_chart_rejects_unrepresentable_change() {
        let json = r#"{"chart":{"result":[{"meta":{"symbol":"XYZ","regularMarketPrice":1e20,"chartPreviousClose":1e-8}}]}}"#;
        assert!(matches!(parse_chart(json), Err(FeedError::Parse(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_quote_is_dropped() {
        let mut http = MockHttpClient::new();
        http.expect_get_text().returning(|url: &str| {
            if url.contains("/XYZ?") {
                Ok(r#"{"chart":{"result":[{"meta":{"symbol":"XYZ","regularMarketPrice":1e20,"chartPreviousClose":1e-8}}]}}"#.to_string())
            } else {
                Ok(chart_json("AAPL", 200.0, 190.0))
            }
        });

        let feed = StocksFeed::new(
            StocksParams {
                symbols: vec!["XYZ".into(), "AAPL".into()],
            },
            Arc::new(http),
        );
        let outcome = feed.fetch().await.unwrap();
        assert_eq!(outcome.dropped, 1);
        assert_eq!(outcome.records.len(), 1);
        assert!(outcome.records[0].title.starts_with("AAPL"));
    }

    #[test]
    fn test_record_formatting() {
        let record = parse_chart(&chart_json("TSLA", 95.0, 100.0))
            .unwrap()
            .into_record(0);
        assert!(record.title.starts_with("TSLA"));
        assert!(record.title.ends_with("95.00"));
        assert_eq!(record.detail.as_deref(), Some("-5.00 (-5.00%)  TSLA Inc."));
        assert_eq!(record.trend, Trend::Down);
    }

    #[tokio::test]
    async fn test_fetch_keeps_watch_list_order_and_drops_bad_symbols() {
        let mut http = MockHttpClient::new();
        http.expect_get_text().returning(|url: &str| {
            if url.contains("/MSFT?") {
                Ok(chart_json("MSFT", 400.0, 390.0))
            } else if url.contains("/AAPL?") {
                Ok(chart_json("AAPL", 200.0, 200.0))
            } else {
                Ok("<html>not json</html>".to_string())
            }
        });

        let feed = StocksFeed::new(
            StocksParams {
                symbols: vec!["MSFT".into(), "BOGUS".into(), "AAPL".into()],
            },
            Arc::new(http),
        );
        let outcome = feed.fetch().await.unwrap();

        assert_eq!(outcome.dropped, 1);
        let symbols: Vec<&str> = outcome
            .records
            .iter()
            .map(|r| r.title.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(symbols, vec!["MSFT", "AAPL"]);
        assert_eq!(outcome.records[1].trend, Trend::Flat);
    }

    #[tokio::test]
    async fn test_fetch_fails_when_every_symbol_fails() {
        let mut http = MockHttpClient::new();
        http.expect_get_text()
            .returning(|_| Err(FeedError::RateLimited { retry_after: None }));

        let feed = StocksFeed::new(
            StocksParams {
                symbols: vec!["AAPL".into(), "MSFT".into()],
            },
            Arc::new(http),
        );
        assert_eq!(
            feed.fetch().await.unwrap_err(),
            FeedError::RateLimited { retry_after: None }
        );
    }
}
