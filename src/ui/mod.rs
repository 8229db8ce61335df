//! UI rendering using ratatui.
//!
//! Rendering is a pure function of the [`Store`] and the snapshots read from
//! the cache for the current frame.

mod layout;
mod widgets;

pub use layout::{Layout, centered_rect};
pub use widgets::{FeedPanel, Health, HelpPanel, StatusBar};

use crate::cache::FeedSnapshot;
use crate::config::{Config, KeyBindings};
use crate::state::Store;
use ratatui::Frame;
use std::sync::Arc;

/// Main UI renderer.
pub struct Ui {
    columns: usize,
    keybindings: KeyBindings,
}

impl Ui {
    /// Create a renderer for `config`.
    pub fn new(config: &Config) -> Self {
        Self {
            columns: config.general.columns,
            keybindings: config.keybindings.clone(),
        }
    }

    /// Render the entire UI. `snapshots` is in panel order.
    pub fn render(&self, frame: &mut Frame, store: &Store, snapshots: &[Arc<FeedSnapshot>]) {
        let layout = Layout::new(frame.area(), store.panels.len(), self.columns);

        StatusBar::render(frame, layout.status_area, store, snapshots);

        for (index, ((panel, snapshot), area)) in store
            .panels
            .iter()
            .zip(snapshots)
            .zip(&layout.panel_areas)
            .enumerate()
        {
            FeedPanel::render(frame, *area, index + 1, panel, snapshot);
        }

        if store.app.show_help {
            HelpPanel::render(frame, frame.area(), &self.keybindings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SnapshotStatus;
    use crate::feeds::{FeedKind, FeedRecord, Trend};
    use crate::state::Action;
    use chrono::Utc;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    fn text(buffer: &Buffer) -> String {
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn draw(store: &Store, snapshots: &[Arc<FeedSnapshot>]) -> String {
        let ui = Ui::new(&Config::default());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|frame| ui.render(frame, store, snapshots))
            .unwrap();
        text(terminal.backend().buffer())
    }

    fn quotes() -> Arc<FeedSnapshot> {
        Arc::new(FeedSnapshot {
            records: vec![
                FeedRecord::new(FeedKind::Stocks, "AAPL    190.00")
                    .with_detail("+1.00 (+0.53%)  Apple")
                    .with_trend(Trend::Up),
                FeedRecord::new(FeedKind::Stocks, "MSFT    410.00").with_trend(Trend::Down),
            ]
            .into(),
            status: SnapshotStatus::Fresh,
            captured_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
            version: 1,
            ..FeedSnapshot::default()
        })
    }

    #[test]
    fn test_renders_panels_and_status() {
        let mut store = Store::new(["stocks", "news"]);
        store.reduce(Action::Ready);
        let failed = Arc::new(FeedSnapshot {
            status: SnapshotStatus::Failed {
                error: "network error: timeout".into(),
            },
            version: 1,
            consecutive_failures: 1,
            ..FeedSnapshot::default()
        });
        store.sync_snapshots(&[quotes(), Arc::clone(&failed)]);

        let screen = draw(&store, &[quotes(), failed]);
        assert!(screen.contains("feedtui"));
        assert!(screen.contains("Running"));
        assert!(screen.contains("1 stocks"));
        assert!(screen.contains("2 news"));
        assert!(screen.contains("AAPL    190.00"));
        assert!(screen.contains("Apple"));
        assert!(screen.contains("Unavailable: network error: timeout"));
        assert!(screen.contains("1 fresh"));
        assert!(screen.contains("1 failed"));
    }

    #[test]
    fn test_stale_panel_keeps_records() {
        let mut store = Store::new(["stocks"]);
        store.reduce(Action::Ready);
        let stale = Arc::new(quotes().after_failure(&crate::error::FeedError::network("reset"), Utc::now()));
        store.sync_snapshots(&[Arc::clone(&stale)]);

        let screen = draw(&store, &[stale]);
        assert!(screen.contains("stale since"));
        assert!(screen.contains("MSFT    410.00"));
        assert!(screen.contains("network error: reset (attempt 1)"));
    }

    #[test]
    fn test_loading_and_help_overlay() {
        let mut store = Store::new(["social"]);
        store.reduce(Action::Ready);
        store.reduce(Action::ToggleHelp);
        let screen = draw(&store, &[Arc::new(FeedSnapshot::loading())]);
        assert!(screen.contains("Help"));
        assert!(screen.contains("Refresh all feeds"));
        assert!(screen.contains("1 loading"));
    }

    #[test]
    fn test_scrolled_panel_hides_earlier_records() {
        let mut store = Store::new(["stocks"]);
        store.reduce(Action::Ready);
        store.sync_snapshots(&[quotes()]);
        store.reduce(Action::ScrollDown);

        let screen = draw(&store, &[quotes()]);
        assert!(!screen.contains("AAPL"));
        assert!(screen.contains("MSFT"));
        assert!(screen.contains("2/2"));
    }
}
