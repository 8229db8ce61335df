//! Help panel widget.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::super::layout::centered_rect;
use crate::config::KeyBindings;

/// Help panel showing keybindings.
pub struct HelpPanel;

impl HelpPanel {
    /// Render the help panel.
    pub fn render(frame: &mut Frame, area: Rect, keybindings: &KeyBindings) {
        let popup_area = centered_rect(60, 80, area);

        // Clear the area behind the popup
        frame.render_widget(Clear, popup_area);

        let kb = keybindings;
        let mut help_text = section("Navigation");
        help_text.extend([
            entry(format!("{}/↓", kb.down), "Scroll down"),
            entry(format!("{}/↑", kb.up), "Scroll up"),
            entry("PgDn/PgUp".to_string(), "Scroll a page"),
            entry(kb.top.clone(), "Go to top"),
            entry(kb.bottom.clone(), "Go to bottom"),
            entry("wheel".to_string(), "Scroll the selected panel"),
        ]);
        help_text.push(Line::from(""));
        help_text.extend(section("Panels"));
        help_text.extend([
            entry(kb.next_panel.clone(), "Focus next panel"),
            entry(kb.prev_panel.clone(), "Focus previous panel"),
            entry("1-9".to_string(), "Focus panel by number"),
            entry(kb.unfocus.clone(), "Release focus"),
        ]);
        help_text.push(Line::from(""));
        help_text.extend(section("Actions"));
        help_text.extend([
            entry(kb.refresh.clone(), "Refresh all feeds"),
            entry(kb.help.clone(), "Toggle help"),
            entry(format!("{}/Ctrl+c", kb.quit), "Quit"),
        ]);

        let help = Paragraph::new(help_text)
            .block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White));

        frame.render_widget(help, popup_area);
    }
}

fn section(name: &'static str) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![Span::styled(
            name,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
    ]
}

fn entry(keys: String, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", keys), Style::default().fg(Color::Cyan)),
        Span::raw(description),
    ])
}
