//! Input event types and key mappings.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Simplified key representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    BackTab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
    Other,
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        match code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Escape,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::F(n) => Key::F(n),
            _ => Key::Other,
        }
    }
}

/// Key modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl From<KeyModifiers> for Modifiers {
    fn from(mods: KeyModifiers) -> Self {
        Self {
            ctrl: mods.contains(KeyModifiers::CONTROL),
            alt: mods.contains(KeyModifiers::ALT),
            shift: mods.contains(KeyModifiers::SHIFT),
        }
    }
}

/// A processed input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl From<KeyEvent> for InputEvent {
    fn from(event: KeyEvent) -> Self {
        Self {
            key: Key::from(event.code),
            modifiers: Modifiers::from(event.modifiers),
        }
    }
}

impl InputEvent {
    /// Create a new input event.
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Get the character if this is a character input.
    pub fn char(&self) -> Option<char> {
        match self.key {
            Key::Char(c) => Some(c),
            _ => None,
        }
    }

    /// Check if Ctrl is held.
    pub fn ctrl(&self) -> bool {
        self.modifiers.ctrl
    }

    /// Check if Alt is held.
    pub fn alt(&self) -> bool {
        self.modifiers.alt
    }

    /// Check if this matches a key binding string (e.g., "Ctrl+q", "Enter", "G").
    ///
    /// Key names are case-insensitive; single-character bindings are
    /// case-sensitive, so `"G"` means the capital letter. Shift is implied by
    /// the character itself and by `BackTab`, so it is only compared for
    /// other named keys.
    pub fn matches(&self, binding: &str) -> bool {
        let mut expected = Modifiers::default();
        let mut expected_key = "";

        for part in binding.split('+') {
            match part.to_lowercase().as_str() {
                "ctrl" => expected.ctrl = true,
                "alt" => expected.alt = true,
                "shift" => expected.shift = true,
                _ => expected_key = part,
            }
        }
        // "Ctrl++" style bindings name the plus key itself.
        if expected_key.is_empty() && binding.ends_with('+') {
            expected_key = "+";
        }

        if self.modifiers.ctrl != expected.ctrl || self.modifiers.alt != expected.alt {
            return false;
        }

        let mut chars = expected_key.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let c = if expected.shift { c.to_ascii_uppercase() } else { c };
            return match self.key {
                // Terminals report Ctrl+letter as the lowercase letter.
                Key::Char(k) if self.modifiers.ctrl => k.eq_ignore_ascii_case(&c),
                Key::Char(k) => k == c,
                _ => false,
            };
        }

        let key = match expected_key.to_lowercase().as_str() {
            "enter" => Key::Enter,
            "esc" | "escape" => Key::Escape,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            "tab" => Key::Tab,
            "backtab" => return self.key == Key::BackTab,
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "space" => Key::Char(' '),
            s if s.starts_with('f') => match s[1..].parse::<u8>() {
                Ok(n) => Key::F(n),
                Err(_) => return false,
            },
            _ => return false,
        };
        self.key == key && self.modifiers.shift == expected.shift
    }
}
