//! State management for the dashboard.
//!
//! Input is turned into [`Action`]s which are folded into the [`Store`] by
//! [`Store::reduce`]. Feed data never lives here: the store only holds view
//! state and remembers which snapshot versions were last drawn, so the render
//! loop can skip frames where nothing changed.

mod app_state;
mod panel_state;

pub use app_state::{AppState, EngineState};
pub use panel_state::PanelState;

use crate::cache::FeedSnapshot;
use std::sync::Arc;

/// Records moved by a page scroll.
const PAGE_SIZE: isize = 10;

/// Actions that can be dispatched to modify state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Lifecycle
    Ready,
    Quit,

    // Focus
    FocusNext,
    FocusPrev,
    FocusPanel(usize),
    Unfocus,

    // Scrolling
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,

    // UI actions
    ToggleHelp,
    Resize,

    // Data refresh
    RefreshAll,
}

/// The global state store.
#[derive(Debug)]
pub struct Store {
    /// Application state.
    pub app: AppState,
    /// Panels in layout order.
    pub panels: Vec<PanelState>,
    /// Panel that scroll actions apply to.
    selected: usize,
    /// View state changed since the last frame.
    view_dirty: bool,
}

impl Store {
    /// Create a store with one panel per feed id, in layout order.
    pub fn new<I, S>(panel_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            app: AppState::new(),
            panels: panel_ids.into_iter().map(PanelState::new).collect(),
            selected: 0,
            view_dirty: true,
        }
    }

    /// Index of the panel scroll actions apply to.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Index of the focused panel, if any.
    pub fn focused(&self) -> Option<usize> {
        self.panels.iter().position(|p| p.focused)
    }

    /// Apply an action to update state.
    pub fn reduce(&mut self, action: Action) {
        match action {
            Action::Ready => {
                if self.app.engine == EngineState::Starting {
                    self.app.engine = EngineState::Running;
                    self.view_dirty = true;
                }
            }
            Action::Quit => {
                self.app.engine = EngineState::ShuttingDown;
                self.app.should_quit = true;
            }

            Action::FocusNext => {
                let next = match self.focused() {
                    Some(i) => (i + 1) % self.panels.len().max(1),
                    None => self.selected,
                };
                self.focus(next);
            }
            Action::FocusPrev => {
                let len = self.panels.len().max(1);
                let prev = match self.focused() {
                    Some(i) => (i + len - 1) % len,
                    None => self.selected,
                };
                self.focus(prev);
            }
            Action::FocusPanel(index) => self.focus(index),
            Action::Unfocus => {
                if self.app.engine == EngineState::Paused {
                    self.app.engine = EngineState::Running;
                }
                for panel in &mut self.panels {
                    panel.focused = false;
                }
                self.view_dirty = true;
            }

            Action::ScrollUp => self.scroll(-1),
            Action::ScrollDown => self.scroll(1),
            Action::PageUp => self.scroll(-PAGE_SIZE),
            Action::PageDown => self.scroll(PAGE_SIZE),
            Action::GoToTop => self.go_to(|_| 0),
            Action::GoToBottom => self.go_to(PanelState::max_offset),

            Action::ToggleHelp => {
                self.app.show_help = !self.app.show_help;
                self.view_dirty = true;
            }
            Action::Resize => self.view_dirty = true,

            // Handled by the app; nothing to change here.
            Action::RefreshAll => {}
        }
    }

    fn focus(&mut self, index: usize) {
        if index >= self.panels.len() || !self.app.is_active() {
            return;
        }
        for (i, panel) in self.panels.iter_mut().enumerate() {
            panel.focused = i == index;
        }
        self.selected = index;
        self.app.engine = EngineState::Paused;
        self.view_dirty = true;
    }

    fn scroll(&mut self, delta: isize) {
        if let Some(panel) = self.panels.get_mut(self.selected) {
            self.view_dirty |= panel.scroll(delta);
        }
    }

    fn go_to(&mut self, target: impl Fn(&PanelState) -> usize) {
        if let Some(panel) = self.panels.get_mut(self.selected) {
            let offset = target(panel);
            self.view_dirty |= panel.set_offset(offset);
        }
    }

    /// Feed the sizes of the current snapshots into the panels.
    ///
    /// `snapshots` is in panel order.
    pub fn sync_snapshots(&mut self, snapshots: &[Arc<FeedSnapshot>]) {
        for (panel, snapshot) in self.panels.iter_mut().zip(snapshots) {
            panel.sync(snapshot.records.len());
        }
    }

    /// Whether drawing `snapshots` would differ from the last frame.
    pub fn needs_redraw(&self, snapshots: &[Arc<FeedSnapshot>]) -> bool {
        self.view_dirty
            || self
                .panels
                .iter()
                .zip(snapshots)
                .any(|(panel, snapshot)| panel.last_rendered_version != Some(snapshot.version))
    }

    /// Remember that `snapshots` have been drawn with the current view state.
    pub fn mark_rendered(&mut self, snapshots: &[Arc<FeedSnapshot>]) {
        for (panel, snapshot) in self.panels.iter_mut().zip(snapshots) {
            panel.last_rendered_version = Some(snapshot.version);
        }
        self.view_dirty = false;
    }
}
