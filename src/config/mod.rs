//! Configuration management for feedtui.

mod settings;

pub use settings::{
    Config, FeedConfig, FeedParams, GeneralConfig, KeyBindings, NewsParams, SocialParams,
    SportsParams, StocksParams,
};

use crate::error::{Error, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "feedtui", "feedtui")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| Error::config("Could not determine config directory"))
}

/// Get the log directory path.
pub fn log_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "feedtui", "feedtui")
        .map(|dirs| dirs.data_dir().join("logs"))
        .ok_or_else(|| Error::config("Could not determine log directory"))
}
