//! Panel showing one feed's snapshot.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::cache::{FeedSnapshot, SnapshotStatus};
use crate::feeds::{FeedKind, FeedRecord, Trend};
use crate::state::PanelState;

/// One dashboard panel.
pub struct FeedPanel;

impl FeedPanel {
    /// Render the panel for `snapshot` into `area`.
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        number: usize,
        panel: &PanelState,
        snapshot: &FeedSnapshot,
    ) {
        let block = Self::block(number, panel, snapshot);

        if snapshot.records.is_empty() {
            let message = match &snapshot.status {
                SnapshotStatus::Loading => {
                    Line::styled("Loading...", Style::default().fg(Color::DarkGray))
                }
                SnapshotStatus::Failed { error } => Line::styled(
                    format!("Unavailable: {}", error),
                    Style::default().fg(Color::Red),
                ),
                _ => Line::styled("Nothing to show", Style::default().fg(Color::DarkGray)),
            };
            let paragraph = Paragraph::new(message)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let items = Self::items(&snapshot.records[panel.scroll_offset.min(snapshot.records.len())..]);
        frame.render_widget(List::new(items).block(block), area);
    }

    fn block(number: usize, panel: &PanelState, snapshot: &FeedSnapshot) -> Block<'static> {
        let border = if panel.focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            match snapshot.status {
                SnapshotStatus::Failed { .. } => Style::default().fg(Color::Red),
                SnapshotStatus::Stale { .. } => Style::default().fg(Color::Yellow),
                _ => Style::default().fg(Color::DarkGray),
            }
        };

        let captured = snapshot
            .captured_at
            .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string());
        let status = match (&snapshot.status, captured) {
            (SnapshotStatus::Loading, _) => {
                Span::styled("loading", Style::default().fg(Color::DarkGray))
            }
            (SnapshotStatus::Fresh, Some(at)) => {
                Span::styled(format!("● {}", at), Style::default().fg(Color::Green))
            }
            (SnapshotStatus::Stale { .. }, Some(at)) => Span::styled(
                format!("◌ stale since {}", at),
                Style::default().fg(Color::Yellow),
            ),
            _ => Span::styled("✗ failed", Style::default().fg(Color::Red)),
        };

        let title = Line::from(vec![
            Span::styled(
                format!(" {} {} ", number, panel.feed_id),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            status,
            Span::raw(" "),
        ]);

        let mut block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border);

        if panel.record_count > 0 {
            block = block.title(
                Line::from(format!(" {}/{} ", panel.scroll_offset + 1, panel.record_count))
                    .right_aligned(),
            );
        }

        match &snapshot.status {
            SnapshotStatus::Stale { error } => {
                block = block.title_bottom(Line::styled(
                    format!(" {} (attempt {}) ", error, snapshot.consecutive_failures),
                    Style::default().fg(Color::Yellow),
                ));
            }
            _ if snapshot.dropped > 0 => {
                block = block.title_bottom(Line::styled(
                    format!(" {} skipped ", snapshot.dropped),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            _ => {}
        }
        block
    }

    fn items(records: &[FeedRecord]) -> Vec<ListItem<'static>> {
        let mut items = Vec::with_capacity(records.len());
        let mut current_group: Option<&str> = None;

        for record in records {
            // Sports records are grouped under a league header.
            if record.kind == FeedKind::Sports && record.group.as_deref() != current_group {
                current_group = record.group.as_deref();
                if let Some(group) = current_group {
                    items.push(ListItem::new(Line::styled(
                        group.to_string(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
            }

            let mut title = vec![Span::styled(record.title.clone(), trend_style(record.trend))];
            if record.kind == FeedKind::Social
                && let Some(host) = &record.group
            {
                title.push(Span::styled(
                    format!(" ({})", host),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            let mut lines = vec![Line::from(title)];
            if let Some(detail) = &record.detail {
                lines.push(Line::styled(
                    format!("  {}", detail),
                    Style::default().fg(Color::Gray),
                ));
            }
            items.push(ListItem::new(lines));
        }
        items
    }
}

fn trend_style(trend: Trend) -> Style {
    match trend {
        Trend::Up => Style::default().fg(Color::Green),
        Trend::Down => Style::default().fg(Color::Red),
        Trend::Flat => Style::default().fg(Color::White),
        Trend::None => Style::default(),
    }
}
