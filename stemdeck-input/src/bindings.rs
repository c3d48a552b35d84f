//! Static key binding table
//!
//! The table is plain data: the dispatcher interprets it and the UI renders
//! its legend rows. Letter keys are stored lowercase and match either case.

use crate::commands::{Action, Direction};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A key as the binding table sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

impl Key {
    /// Lowercase letters; everything else unchanged
    pub fn normalized(self) -> Self {
        match self {
            Key::Char(c) if c.is_ascii_uppercase() => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }

    /// Convert a terminal key event
    ///
    /// Releases and Control/Alt chords map to `None`; those belong to the
    /// front end.
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        if event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return None;
        }
        let key = match event.code {
            KeyCode::Char(' ') => Key::Space,
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Esc => Key::Escape,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            _ => return None,
        };
        Some(key)
    }
}

/// One row of the binding table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: Key,
    pub action: Action,
    /// Key label shown in the legend
    pub legend: &'static str,
    pub description: &'static str,
}

impl KeyBinding {
    const fn new(key: Key, action: Action, legend: &'static str, description: &'static str) -> Self {
        Self {
            key,
            action,
            legend,
            description,
        }
    }
}

/// Shifted digits on a US layout, in digit order
pub const SHIFTED_DIGITS: [char; 9] = ['!', '@', '#', '$', '%', '^', '&', '*', '('];

macro_rules! channel_rows {
    ($($index:literal => $digit:literal, $shifted:literal;)*) => {
        [
            $(
                KeyBinding::new(Key::Char($digit), Action::ToggleSolo($index), "1-9", "Solo stem"),
                KeyBinding::new(Key::Char($shifted), Action::ToggleMute($index), "Shift+1-9", "Mute stem"),
            )*
        ]
    };
}

const TRANSPORT_ROWS: [KeyBinding; 9] = [
    KeyBinding::new(Key::Space, Action::TogglePlayPause, "Space", "Play / pause"),
    KeyBinding::new(Key::Char('s'), Action::Stop, "S / Esc", "Stop"),
    KeyBinding::new(Key::Escape, Action::Stop, "S / Esc", "Stop"),
    KeyBinding::new(Key::Left, Action::Seek(Direction::Down), "Left / Right", "Seek 10s"),
    KeyBinding::new(Key::Right, Action::Seek(Direction::Up), "Left / Right", "Seek 10s"),
    KeyBinding::new(Key::Up, Action::MasterVolume(Direction::Up), "Up / Down", "Master volume"),
    KeyBinding::new(Key::Down, Action::MasterVolume(Direction::Down), "Up / Down", "Master volume"),
    KeyBinding::new(Key::Char('m'), Action::ToggleMasterMute, "M", "Mute master"),
    KeyBinding::new(Key::Char('f'), Action::TogglePresentation, "F", "Expand view"),
];

const CHANNEL_ROWS: [KeyBinding; 18] = channel_rows! {
    0 => '1', '!';
    1 => '2', '@';
    2 => '3', '#';
    3 => '4', '$';
    4 => '5', '%';
    5 => '6', '^';
    6 => '7', '&';
    7 => '8', '*';
    8 => '9', '(';
};

/// Every binding, transport keys first
pub fn bindings() -> impl Iterator<Item = &'static KeyBinding> {
    TRANSPORT_ROWS.iter().chain(CHANNEL_ROWS.iter())
}

/// Find the binding for a key, ignoring letter case
pub fn lookup(key: Key) -> Option<&'static KeyBinding> {
    let key = key.normalized();
    bindings().find(|b| b.key == key)
}

/// Legend rows `(keys, description)` in table order, one per distinct row
pub fn legend() -> Vec<(&'static str, &'static str)> {
    let mut rows: Vec<(&'static str, &'static str)> = Vec::new();
    for binding in bindings() {
        let row = (binding.legend, binding.description);
        if !rows.contains(&row) {
            rows.push(row);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letters_match_either_case() {
        assert_eq!(lookup(Key::Char('S')).unwrap().action, Action::Stop);
        assert_eq!(lookup(Key::Char('f')).unwrap().action, Action::TogglePresentation);
        assert_eq!(lookup(Key::Char('F')).unwrap().action, Action::TogglePresentation);
        assert_eq!(lookup(Key::Char('M')).unwrap().action, Action::ToggleMasterMute);
    }

    #[test]
    fn test_digits_and_shifted_digits() {
        for (i, shifted) in SHIFTED_DIGITS.iter().enumerate() {
            let digit = char::from_digit(i as u32 + 1, 10).unwrap();
            assert_eq!(lookup(Key::Char(digit)).unwrap().action, Action::ToggleSolo(i));
            assert_eq!(lookup(Key::Char(*shifted)).unwrap().action, Action::ToggleMute(i));
        }
        assert!(lookup(Key::Char('0')).is_none());
    }

    #[test]
    fn test_escape_and_s_both_stop() {
        assert_eq!(lookup(Key::Escape).unwrap().action, Action::Stop);
        assert_eq!(lookup(Key::Char('s')).unwrap().action, Action::Stop);
    }

    #[test]
    fn test_each_key_bound_once() {
        let keys: Vec<Key> = bindings().map(|b| b.key).collect();
        for (i, key) in keys.iter().enumerate() {
            assert!(!keys[i + 1..].contains(key), "{:?} bound twice", key);
        }
    }

    #[test]
    fn test_legend_rows_are_grouped() {
        let rows = legend();
        assert_eq!(rows[0], ("Space", "Play / pause"));
        assert!(rows.contains(&("1-9", "Solo stem")));
        assert!(rows.contains(&("Shift+1-9", "Mute stem")));
        assert_eq!(rows.len(), 8);
    }

    #[test]
    fn test_from_event() {
        let press = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        assert_eq!(Key::from_event(&press), Some(Key::Space));

        let shifted = KeyEvent::new(KeyCode::Char('@'), KeyModifiers::SHIFT);
        assert_eq!(Key::from_event(&shifted), Some(Key::Char('@')));

        let chord = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&chord), None);

        let mut release = KeyEvent::new(KeyCode::Up, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(Key::from_event(&release), None);
    }
}
