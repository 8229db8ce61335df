//! Layout management for the TUI.

use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// UI layout areas.
pub struct Layout {
    /// Status bar area (top).
    pub status_area: Rect,
    /// One area per panel, in layout order.
    pub panel_areas: Vec<Rect>,
}

impl Layout {
    /// Split the terminal into a status bar and a grid of `panels` cells.
    ///
    /// Panels fill rows of `columns` cells left to right; a short last row
    /// stretches its panels across the full width.
    pub fn new(area: Rect, panels: usize, columns: usize) -> Self {
        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Status bar
                Constraint::Min(0),    // Panels
            ])
            .split(area);

        Self {
            status_area: chunks[0],
            panel_areas: grid(chunks[1], panels, columns.max(1)),
        }
    }
}

fn grid(area: Rect, panels: usize, columns: usize) -> Vec<Rect> {
    if panels == 0 {
        return Vec::new();
    }
    let columns = columns.min(panels);
    let rows = panels.div_ceil(columns);

    let row_areas = RatatuiLayout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    let mut cells = Vec::with_capacity(panels);
    for (row, row_area) in row_areas.iter().enumerate() {
        let in_row = (panels - row * columns).min(columns);
        let row_cells = RatatuiLayout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, in_row as u32); in_row])
            .split(*row_area);
        cells.extend(row_cells.iter().copied());
    }
    cells
}

/// Create a centered popup area.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = RatatuiLayout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    RatatuiLayout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_of_four_in_two_columns() {
        let layout = Layout::new(Rect::new(0, 0, 100, 41), 4, 2);
        assert_eq!(layout.status_area, Rect::new(0, 0, 100, 1));
        assert_eq!(layout.panel_areas.len(), 4);
        assert_eq!(layout.panel_areas[0], Rect::new(0, 1, 50, 20));
        assert_eq!(layout.panel_areas[1], Rect::new(50, 1, 50, 20));
        assert_eq!(layout.panel_areas[2], Rect::new(0, 21, 50, 20));
        assert_eq!(layout.panel_areas[3], Rect::new(50, 21, 50, 20));
    }

    #[test]
    fn test_short_last_row_stretches() {
        let layout = Layout::new(Rect::new(0, 0, 90, 31), 3, 2);
        assert_eq!(layout.panel_areas.len(), 3);
        assert_eq!(layout.panel_areas[2].width, 90);
    }

    #[test]
    fn test_more_columns_than_panels() {
        let layout = Layout::new(Rect::new(0, 0, 80, 25), 1, 3);
        assert_eq!(layout.panel_areas, vec![Rect::new(0, 1, 80, 24)]);
        assert!(Layout::new(Rect::new(0, 0, 80, 25), 0, 2).panel_areas.is_empty());
    }
}
