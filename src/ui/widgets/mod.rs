//! TUI widgets.

mod feed_panel;
mod help;
mod status_bar;

pub use feed_panel::FeedPanel;
pub use help::HelpPanel;
pub use status_bar::{Health, StatusBar};
