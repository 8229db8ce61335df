//! Error types for feedtui.

use std::time::Duration;
use thiserror::Error;

/// The main error type for feedtui.
///
/// Only [`Error::Config`] and [`Error::Terminal`] (plus the IO errors that
/// surface while driving the terminal) abort the engine. Feed failures are
/// carried as [`FeedError`] and end up in a feed's snapshot status instead.
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file operations, terminal, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Terminal/TUI related errors
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A feed fetch failed.
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Alias for Result with our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new terminal error.
    pub fn terminal(msg: impl Into<String>) -> Self {
        Self::Terminal(msg.into())
    }

    /// Create a new config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Why a single fetch attempt failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Connection, timeout or unexpected HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// Upstream rejected our credentials.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response body could not be understood at all.
    #[error("parse error: {0}")]
    Parse(String),

    /// Upstream asked us to slow down.
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// Value of the `Retry-After` header, when present.
        retry_after: Option<Duration>,
    },
}

impl FeedError {
    /// Create a new network error.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a new auth error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a new parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Check if retrying later can succeed without user intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimited { .. })
    }

    /// Minimum wait requested by upstream before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// Ranking used when several sub-requests fail and one error must be reported.
    pub(crate) fn severity(&self) -> u8 {
        match self {
            Self::Auth(_) => 3,
            Self::RateLimited { .. } => 2,
            Self::Network(_) => 1,
            Self::Parse(_) => 0,
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
