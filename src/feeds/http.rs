//! HTTP transport shared by every feed source.

use crate::error::FeedError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Minimal GET-only HTTP capability.
///
/// Feed sources depend on this trait rather than on `reqwest` directly so
/// that parsing and aggregation can be exercised without a network.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch `url` and return the response body as text.
    async fn get_text(&self, url: &str) -> Result<String, FeedError>;
}

/// [`HttpClient`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("Mozilla/5.0 (compatible; feedtui/", env!("CARGO_PKG_VERSION"), ")"))
            .build()
            .map_err(|e| FeedError::network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<String, FeedError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(status_error(status, retry_after));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::network(e.to_string()))
    }
}

/// Map a non-success HTTP status onto the feed error taxonomy.
pub(crate) fn status_error(status: StatusCode, retry_after: Option<Duration>) -> FeedError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FeedError::auth(format!("HTTP {}", status.as_u16()))
        }
        StatusCode::TOO_MANY_REQUESTS => FeedError::RateLimited { retry_after },
        _ => FeedError::network(format!("HTTP {}", status.as_u16())),
    }
}

/// Parse a `Retry-After` header given in delta-seconds.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
