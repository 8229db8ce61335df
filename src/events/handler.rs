//! Event handler for processing input events.

use super::{InputEvent, Key};
use crate::config::KeyBindings;
use crate::state::{Action, Store};
use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};

/// Handles input events and produces actions.
pub struct EventHandler {
    /// Key bindings.
    keybindings: KeyBindings,
    /// Whether mouse events are translated.
    mouse: bool,
    /// Store state relevant to key handling.
    store_snapshot: StoreSnapshot,
}

/// Snapshot of relevant store state for event handling.
#[derive(Debug, Clone, Copy, Default)]
struct StoreSnapshot {
    show_help: bool,
    focused: bool,
    panel_count: usize,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new(keybindings: KeyBindings, mouse: bool) -> Self {
        Self {
            keybindings,
            mouse,
            store_snapshot: StoreSnapshot::default(),
        }
    }

    /// Update the store snapshot for state-aware event handling.
    pub fn update_store_snapshot(&mut self, store: &Store) {
        self.store_snapshot = StoreSnapshot {
            show_help: store.app.show_help,
            focused: store.focused().is_some(),
            panel_count: store.panels.len(),
        };
    }

    /// Translate a terminal event into an action.
    pub fn handle_event(&self, event: &CrosstermEvent) -> Option<Action> {
        match event {
            CrosstermEvent::Key(key) => self.handle_key(*key),
            CrosstermEvent::Mouse(mouse) if self.mouse => self.handle_mouse(*mouse),
            CrosstermEvent::Resize(_, _) => Some(Action::Resize),
            _ => None,
        }
    }

    /// Handle a key event and return an optional action.
    fn handle_key(&self, key: KeyEvent) -> Option<Action> {
        // Only process key press events
        if key.kind != KeyEventKind::Press {
            return None;
        }

        let input = InputEvent::from(key);
        let kb = &self.keybindings;
        let snapshot = &self.store_snapshot;

        // Ctrl+C always quits, whatever the bindings say.
        if input.matches("Ctrl+c") || input.matches(&kb.quit) {
            return Some(Action::Quit);
        }

        // While help is open, the help key and Esc only close it.
        if snapshot.show_help {
            return (input.matches(&kb.help) || input.key == Key::Escape)
                .then_some(Action::ToggleHelp);
        }

        if input.matches(&kb.help) {
            return Some(Action::ToggleHelp);
        }
        if input.matches(&kb.refresh) {
            return Some(Action::RefreshAll);
        }

        // Focus
        if input.matches(&kb.next_panel) {
            return Some(Action::FocusNext);
        }
        if input.matches(&kb.prev_panel) {
            return Some(Action::FocusPrev);
        }
        if input.matches(&kb.unfocus) {
            return snapshot.focused.then_some(Action::Unfocus);
        }
        if let Some(index) = panel_number(&input)
            && index < snapshot.panel_count
        {
            return Some(Action::FocusPanel(index));
        }

        // Navigation
        if input.matches(&kb.up) || input.key == Key::Up {
            return Some(Action::ScrollUp);
        }
        if input.matches(&kb.down) || input.key == Key::Down {
            return Some(Action::ScrollDown);
        }
        if input.matches(&kb.top) || input.key == Key::Home {
            return Some(Action::GoToTop);
        }
        if input.matches(&kb.bottom) || input.key == Key::End {
            return Some(Action::GoToBottom);
        }
        match input.key {
            Key::PageUp => Some(Action::PageUp),
            Key::PageDown => Some(Action::PageDown),
            _ => None,
        }
    }

    /// Handle a mouse event and return an optional action.
    fn handle_mouse(&self, mouse: MouseEvent) -> Option<Action> {
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Action::ScrollUp),
            MouseEventKind::ScrollDown => Some(Action::ScrollDown),
            _ => None,
        }
    }
}

/// Zero-based panel index for the digit keys `1`-`9`.
fn panel_number(input: &InputEvent) -> Option<usize> {
    if input.ctrl() || input.alt() {
        return None;
    }
    match input.char()? {
        c @ '1'..='9' => Some(c as usize - '1' as usize),
        _ => None,
    }
}
