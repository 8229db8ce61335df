//! Configuration settings for feedtui.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Frames are never drawn more often than this.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Main configuration struct.
///
/// Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Global settings.
    pub general: GeneralConfig,
    /// Key bindings.
    pub keybindings: KeyBindings,
    /// Configured feeds, keyed by feed identifier.
    pub feeds: BTreeMap<String, FeedConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut feeds = BTreeMap::new();
        feeds.insert(
            "stocks".to_string(),
            FeedConfig::new(
                30,
                FeedParams::Stocks(StocksParams {
                    symbols: ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "TSLA"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                }),
            ),
        );
        feeds.insert(
            "news".to_string(),
            FeedConfig::new(
                300,
                FeedParams::News(NewsParams {
                    urls: vec![
                        "https://feeds.bbci.co.uk/news/world/rss.xml".to_string(),
                        "https://feeds.arstechnica.com/arstechnica/index".to_string(),
                    ],
                    max_items: default_max_items(),
                }),
            ),
        );
        feeds.insert(
            "sports".to_string(),
            FeedConfig::new(
                60,
                FeedParams::Sports(SportsParams {
                    leagues: vec!["nba".to_string(), "nfl".to_string()],
                }),
            ),
        );
        feeds.insert(
            "social".to_string(),
            FeedConfig::new(
                120,
                FeedParams::Social(SocialParams {
                    story_type: default_story_type(),
                    story_count: default_story_count(),
                }),
            ),
        );

        Self {
            general: GeneralConfig {
                layout: ["stocks", "news", "sports", "social"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                ..GeneralConfig::default()
            },
            keybindings: KeyBindings::default(),
            feeds,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file layered with `FEEDTUI__*` environment overrides.
    ///
    /// A missing file is not an error; defaults fill every unset value.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = path.unwrap_or_else(Self::default_path);
        Self::load_from(&config_path)
    }

    /// Default location of the config file.
    pub fn default_path() -> PathBuf {
        super::config_dir()
            .map(|p| p.join("config.toml"))
            .unwrap_or_else(|_| PathBuf::from("config.toml"))
    }

    fn load_from(path: &Path) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("FEEDTUI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        if !path.exists() {
            tracing::info!("No config file at {}, using defaults", path.display());
        }

        Ok(settings.try_deserialize()?)
    }

    /// Parse a configuration from TOML source text.
    pub fn from_toml(source: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if self.general.columns == 0 {
            return Err(Error::config("general.columns must be at least 1"));
        }
        if self.general.request_timeout_secs == 0 {
            return Err(Error::config(
                "general.request_timeout_secs must be at least 1",
            ));
        }

        let floor = self.refresh_floor();
        let mut enabled = 0usize;
        for (id, feed) in &self.feeds {
            if !feed.enabled {
                continue;
            }
            enabled += 1;
            if feed.refresh_secs == 0 {
                return Err(Error::config(format!(
                    "feed '{}' must refresh at least every 1s",
                    id
                )));
            }
            if feed.refresh_interval() < floor {
                return Err(Error::config(format!(
                    "feed '{}' refreshes every {}s, below the {}s floor",
                    id,
                    feed.refresh_secs,
                    floor.as_secs()
                )));
            }
            feed.params
                .validate()
                .map_err(|msg| Error::config(format!("feed '{}': {}", id, msg)))?;
        }

        if enabled == 0 {
            return Err(Error::config("no feeds are enabled"));
        }

        let mut seen = HashSet::new();
        for panel in &self.general.layout {
            match self.feeds.get(panel) {
                None => {
                    return Err(Error::config(format!(
                        "layout references unknown feed '{}'",
                        panel
                    )));
                }
                Some(feed) if !feed.enabled => {
                    return Err(Error::config(format!(
                        "layout references disabled feed '{}'",
                        panel
                    )));
                }
                Some(_) => {}
            }
            if !seen.insert(panel.as_str()) {
                return Err(Error::config(format!(
                    "layout lists feed '{}' more than once",
                    panel
                )));
            }
        }

        Ok(())
    }

    /// Panel identifiers in display order.
    ///
    /// An empty layout shows every enabled feed in identifier order.
    pub fn panels(&self) -> Vec<String> {
        if self.general.layout.is_empty() {
            self.enabled_feeds().map(|(id, _)| id.clone()).collect()
        } else {
            self.general.layout.clone()
        }
    }

    /// Iterate over enabled feeds.
    pub fn enabled_feeds(&self) -> impl Iterator<Item = (&String, &FeedConfig)> {
        self.feeds.iter().filter(|(_, feed)| feed.enabled)
    }

    /// Minimum allowed refresh interval.
    pub fn refresh_floor(&self) -> Duration {
        Duration::from_secs(self.general.refresh_floor_secs)
    }

    /// Render cadence, never faster than [`MIN_FRAME_INTERVAL`].
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.general.frame_interval_ms).max(MIN_FRAME_INTERVAL)
    }

    /// Upper bound for the backoff delay.
    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.general.max_backoff_secs)
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.general.request_timeout_secs)
    }

    /// Apply a global refresh interval to every feed.
    ///
    /// Intervals below the floor are raised to it.
    pub fn with_refresh_override(mut self, interval: Duration) -> Self {
        let floor = self.refresh_floor();
        let effective = if interval < floor {
            tracing::warn!(
                "Refresh override of {}s is below the {}s floor; using the floor",
                interval.as_secs(),
                floor.as_secs()
            );
            floor
        } else {
            interval
        };
        for feed in self.feeds.values_mut() {
            feed.refresh_secs = effective.as_secs();
        }
        self
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Panel order; each entry names an enabled feed.
    pub layout: Vec<String>,
    /// Number of panel columns in the grid.
    pub columns: usize,
    /// Minimum refresh interval in seconds for any feed.
    pub refresh_floor_secs: u64,
    /// Frame interval in milliseconds.
    pub frame_interval_ms: u64,
    /// Multiplier applied to the interval per consecutive failure.
    pub backoff_multiplier: u32,
    /// Backoff cap in seconds.
    pub max_backoff_secs: u64,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Enable mouse support.
    pub mouse_support: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            layout: Vec::new(),
            columns: 2,
            refresh_floor_secs: 5,
            frame_interval_ms: 250,
            backoff_multiplier: 2,
            max_backoff_secs: 600,
            request_timeout_secs: 10,
            mouse_support: true,
        }
    }
}

/// Settings for one feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Whether the feed is polled and may appear in the layout.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Nominal refresh interval in seconds.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
    /// Kind-specific parameters.
    #[serde(flatten)]
    pub params: FeedParams,
}

impl FeedConfig {
    /// Create an enabled feed with the given interval.
    pub fn new(refresh_secs: u64, params: FeedParams) -> Self {
        Self {
            enabled: true,
            refresh_secs,
            params,
        }
    }

    /// Nominal refresh interval.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }
}

/// Kind-specific feed parameters, selected by the `kind` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedParams {
    Stocks(StocksParams),
    News(NewsParams),
    Sports(SportsParams),
    Social(SocialParams),
}

impl FeedParams {
    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Stocks(p) => {
                if p.symbols.iter().all(|s| s.trim().is_empty()) {
                    return Err("stocks feed needs at least one symbol".to_string());
                }
            }
            Self::News(p) => {
                if p.urls.iter().all(|u| u.trim().is_empty()) {
                    return Err("news feed needs at least one url".to_string());
                }
                if p.max_items == 0 {
                    return Err("max_items must be at least 1".to_string());
                }
            }
            Self::Sports(p) => {
                if p.leagues.is_empty() {
                    return Err("sports feed needs at least one league".to_string());
                }
                if let Some(bad) = p
                    .leagues
                    .iter()
                    .find(|l| crate::feeds::sports::league_path(l).is_none())
                {
                    return Err(format!("unknown league '{}'", bad));
                }
            }
            Self::Social(p) => {
                if p.story_count == 0 {
                    return Err("story_count must be at least 1".to_string());
                }
                if !matches!(
                    p.story_type.as_str(),
                    "top" | "new" | "best" | "ask" | "show" | "job"
                ) {
                    return Err(format!("unknown story_type '{}'", p.story_type));
                }
            }
        }
        Ok(())
    }
}

/// Stock watch-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StocksParams {
    /// Ticker symbols in display order.
    #[serde(default)]
    pub symbols: Vec<String>,
}

/// RSS news sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsParams {
    /// RSS 2.0 feed URLs.
    #[serde(default)]
    pub urls: Vec<String>,
    /// Maximum headlines kept per poll.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
}

/// Scoreboard leagues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SportsParams {
    /// League short names (`nba`, `nfl`, ...) or `sport/league` paths.
    #[serde(default)]
    pub leagues: Vec<String>,
}

/// Hacker News story list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialParams {
    /// Story list: top, new, best, ask, show or job.
    #[serde(default = "default_story_type")]
    pub story_type: String,
    /// Number of stories to fetch.
    #[serde(default = "default_story_count")]
    pub story_count: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_refresh_secs() -> u64 {
    60
}

fn default_max_items() -> usize {
    30
}

fn default_story_type() -> String {
    "top".to_string()
}

fn default_story_count() -> usize {
    20
}

/// Key bindings configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    /// Quit the application.
    pub quit: String,
    /// Show help.
    pub help: String,
    /// Scroll up.
    pub up: String,
    /// Scroll down.
    pub down: String,
    /// Jump to the first record.
    pub top: String,
    /// Jump to the last record.
    pub bottom: String,
    /// Focus the next panel.
    pub next_panel: String,
    /// Focus the previous panel.
    pub prev_panel: String,
    /// Release panel focus.
    pub unfocus: String,
    /// Poll every feed now.
    pub refresh: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: "q".to_string(),
            help: "?".to_string(),
            up: "k".to_string(),
            down: "j".to_string(),
            top: "g".to_string(),
            bottom: "G".to_string(),
            next_panel: "Tab".to_string(),
            prev_panel: "BackTab".to_string(),
            unfocus: "Esc".to_string(),
            refresh: "r".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
[general]
layout = ["quotes", "headlines"]
columns = 1
refresh_floor_secs = 10
frame_interval_ms = 20

[feeds.quotes]
kind = "stocks"
refresh_secs = 15
symbols = ["AAPL", "MSFT"]

[feeds.headlines]
kind = "news"
urls = ["https://example.com/rss.xml"]

[feeds.scores]
kind = "sports"
enabled = false
leagues = ["nba"]
"#;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.panels(),
            vec!["stocks", "news", "sports", "social"]
        );
    }

    #[test]
    fn test_parse_sample() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert!(config.validate().is_ok());

        let quotes = &config.feeds["quotes"];
        assert_eq!(quotes.refresh_secs, 15);
        assert_eq!(
            quotes.params,
            FeedParams::Stocks(StocksParams {
                symbols: vec!["AAPL".to_string(), "MSFT".to_string()],
            })
        );

        let headlines = &config.feeds["headlines"];
        assert!(headlines.enabled);
        assert_eq!(headlines.refresh_secs, 60);
        match &headlines.params {
            FeedParams::News(p) => assert_eq!(p.max_items, 30),
            other => panic!("unexpected params {:?}", other),
        }

        assert!(!config.feeds["scores"].enabled);
        assert_eq!(config.enabled_feeds().count(), 2);
    }

    #[test]
    fn test_frame_interval_is_clamped() {
        let config = Config::from_toml(SAMPLE).unwrap();
        assert_eq!(config.frame_interval(), MIN_FRAME_INTERVAL);
    }

    #[test]
    fn test_rejects_disabled_feed_in_layout() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.general.layout.push("scores".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("disabled feed 'scores'"));
    }

    #[test]
    fn test_rejects_unknown_feed_in_layout() {
        let mut config = Config::default();
        config.general.layout.push("weather".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown feed 'weather'"));
    }

    #[test]
    fn test_rejects_interval_below_floor() {
        let mut config = Config::default();
        config.feeds.get_mut("stocks").unwrap().refresh_secs = 1;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("below the 5s floor"));
    }

    #[test]
    fn test_rejects_zero_interval_without_floor() {
        let mut config = Config::default();
        config.general.refresh_floor_secs = 0;
        assert!(config.validate().is_ok());

        config.feeds.get_mut("news").unwrap().refresh_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("feed 'news' must refresh"));
    }

    #[test]
    fn test_rejects_zero_request_timeout() {
        let mut config = Config::default();
        config.general.request_timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn test_disabled_feed_below_floor_is_ignored() {
        let mut config = Config::default();
        let social = config.feeds.get_mut("social").unwrap();
        social.refresh_secs = 1;
        social.enabled = false;
        config.general.layout.retain(|p| p != "social");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_missing_params() {
        let mut config = Config::default();
        config.feeds.insert(
            "stocks".to_string(),
            FeedConfig::new(30, FeedParams::Stocks(StocksParams { symbols: vec![] })),
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one symbol"));

        let mut config = Config::default();
        config.feeds.insert(
            "sports".to_string(),
            FeedConfig::new(
                60,
                FeedParams::Sports(SportsParams {
                    leagues: vec!["quidditch".to_string()],
                }),
            ),
        );
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unknown league 'quidditch'"));
    }

    #[test]
    fn test_rejects_duplicate_panels() {
        let mut config = Config::default();
        config.general.layout.push("news".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_layout_shows_enabled_feeds() {
        let mut config = Config::from_toml(SAMPLE).unwrap();
        config.general.layout.clear();
        assert!(config.validate().is_ok());
        assert_eq!(config.panels(), vec!["headlines", "quotes"]);
    }

    #[test]
    fn test_refresh_override() {
        let config = Config::default().with_refresh_override(Duration::from_secs(90));
        assert!(config.feeds.values().all(|f| f.refresh_secs == 90));

        let config = Config::default().with_refresh_override(Duration::from_secs(1));
        assert!(config.feeds.values().all(|f| f.refresh_secs == 5));
        assert!(config.validate().is_ok());
    }
}
