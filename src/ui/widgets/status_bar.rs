//! Status bar widget.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::sync::Arc;

use crate::cache::{FeedSnapshot, SnapshotStatus};
use crate::state::{EngineState, Store};

/// Feed counts by status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub fresh: usize,
    pub stale: usize,
    pub failed: usize,
    pub loading: usize,
}

impl Health {
    /// Tally `snapshots` by status.
    pub fn of(snapshots: &[Arc<FeedSnapshot>]) -> Self {
        let mut health = Self::default();
        for snapshot in snapshots {
            match snapshot.status {
                SnapshotStatus::Fresh => health.fresh += 1,
                SnapshotStatus::Stale { .. } => health.stale += 1,
                SnapshotStatus::Failed { .. } => health.failed += 1,
                SnapshotStatus::Loading => health.loading += 1,
            }
        }
        health
    }
}

/// Status bar widget.
pub struct StatusBar;

impl StatusBar {
    /// Render the status bar.
    pub fn render(frame: &mut Frame, area: Rect, store: &Store, snapshots: &[Arc<FeedSnapshot>]) {
        let engine_color = match store.app.engine {
            EngineState::Running => Color::Green,
            EngineState::Paused => Color::Cyan,
            EngineState::Starting | EngineState::ShuttingDown => Color::Yellow,
        };
        let engine = Span::styled(
            format!(" {} ", store.app.engine),
            Style::default().fg(engine_color),
        );

        let health = Health::of(snapshots);
        let mut left_content = vec![
            Span::styled(
                " feedtui ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("|"),
            engine,
            Span::raw("| "),
            Span::styled(
                format!("● {} fresh ", health.fresh),
                Style::default().fg(Color::Green),
            ),
        ];
        if health.stale > 0 {
            left_content.push(Span::styled(
                format!("◌ {} stale ", health.stale),
                Style::default().fg(Color::Yellow),
            ));
        }
        if health.failed > 0 {
            left_content.push(Span::styled(
                format!("✗ {} failed ", health.failed),
                Style::default().fg(Color::Red),
            ));
        }
        if health.loading > 0 {
            left_content.push(Span::styled(
                format!("… {} loading ", health.loading),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ));
        }

        let hints = if store.focused().is_some() {
            " Esc release | j/k scroll | r refresh | ? help | q quit "
        } else {
            " Tab focus | r refresh | ? help | q quit "
        };
        let help_hint = Span::styled(hints, Style::default().fg(Color::Gray));

        // Calculate padding for right-aligned help hint
        let left_len: usize = left_content.iter().map(|s| s.content.chars().count()).sum();
        let right_len = help_hint.content.chars().count();
        let padding = (area.width as usize).saturating_sub(left_len + right_len);

        let mut full_line = left_content;
        full_line.push(Span::raw(" ".repeat(padding)));
        full_line.push(help_hint);

        let paragraph =
            Paragraph::new(Line::from(full_line)).style(Style::default().bg(Color::DarkGray));

        frame.render_widget(paragraph, area);
    }
}
