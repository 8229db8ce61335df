//! # feedtui - terminal feed dashboard
//!
//! Polls stock quotes, news headlines, sports scores and Hacker News stories
//! on independent schedules and shows the freshest snapshot of each in a
//! multi-panel terminal UI. A slow or failing feed never holds up the others.
//!
//! ## Architecture
//!
//! - **Feeds**: the closed set of upstream sources and their normalization
//! - **Cache**: one atomically replaced snapshot per feed
//! - **Scheduler**: one polling task per feed with backoff and skip-if-busy
//! - **App**: terminal lifecycle, frame clock and input loop
//! - **State**: view state and redraw bookkeeping
//! - **UI**: layout and rendering logic
//! - **Events**: input handling
//! - **Config**: configuration management

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod feeds;
pub mod scheduler;
pub mod state;
pub mod ui;

pub use app::{App, Dashboard, run};
pub use cache::{FeedCache, FeedSnapshot, SnapshotStatus};
pub use config::Config;
pub use error::{Error, FeedError, Result};
pub use scheduler::PollScheduler;
