//! Keyboard state for the tick loop.
//!
//! Gameplay code never talks to macroquad directly: the handler samples the
//! keyboard once per tick into a [`KeyState`], and every consumer reads the
//! same [`InputFrame`] so edge detection is consistent within a tick.

mod handler;

pub use handler::InputHandler;

use serde::{Deserialize, Serialize};

/// Keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Space,
    Enter,
    F,
    G,
    #[serde(rename = "1")]
    Digit1,
    #[serde(rename = "2")]
    Digit2,
    #[serde(rename = "3")]
    Digit3,
    #[serde(rename = "4")]
    Digit4,
    W,
    S,
}

impl Key {
    pub const ALL: [Key; 14] = [
        Key::Up,
        Key::Down,
        Key::Left,
        Key::Right,
        Key::Space,
        Key::Enter,
        Key::F,
        Key::G,
        Key::Digit1,
        Key::Digit2,
        Key::Digit3,
        Key::Digit4,
        Key::W,
        Key::S,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Digit keys map to answer slots 0..=3
    pub fn digit_index(self) -> Option<usize> {
        match self {
            Key::Digit1 => Some(0),
            Key::Digit2 => Some(1),
            Key::Digit3 => Some(2),
            Key::Digit4 => Some(3),
            _ => None,
        }
    }

    /// Name shown in on-screen prompts
    pub fn label(self) -> &'static str {
        match self {
            Key::Up => "Up",
            Key::Down => "Down",
            Key::Left => "Left",
            Key::Right => "Right",
            Key::Space => "Space",
            Key::Enter => "Enter",
            Key::F => "F",
            Key::G => "G",
            Key::Digit1 => "1",
            Key::Digit2 => "2",
            Key::Digit3 => "3",
            Key::Digit4 => "4",
            Key::W => "W",
            Key::S => "S",
        }
    }
}

/// Set of keys held during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    held: u16,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: Key) -> Self {
        self.set(key, true);
        self
    }

    pub fn set(&mut self, key: Key, down: bool) {
        if down {
            self.held |= key.bit();
        } else {
            self.held &= !key.bit();
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held & key.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.held == 0
    }
}

/// Current and previous key states, giving edge-triggered queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub now: KeyState,
    pub prev: KeyState,
}

impl InputFrame {
    pub fn new(now: KeyState, prev: KeyState) -> Self {
        Self { now, prev }
    }

    /// Frame with `now` held and nothing held last tick
    pub fn fresh(now: KeyState) -> Self {
        Self { now, prev: KeyState::new() }
    }

    /// Advance to the next tick
    pub fn next(&self, now: KeyState) -> Self {
        Self { now, prev: self.now }
    }

    pub fn down(&self, key: Key) -> bool {
        self.now.is_down(key)
    }

    /// Down this tick and up the previous one
    pub fn pressed(&self, key: Key) -> bool {
        self.now.is_down(key) && !self.prev.is_down(key)
    }

    pub fn released(&self, key: Key) -> bool {
        !self.now.is_down(key) && self.prev.is_down(key)
    }

    /// First digit key pressed this tick, as an answer index
    pub fn pressed_digit(&self) -> Option<usize> {
        [Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4]
            .into_iter()
            .find(|k| self.pressed(*k))
            .and_then(Key::digit_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state_set_and_clear() {
        let mut keys = KeyState::new().with(Key::Enter).with(Key::Left);
        assert!(keys.is_down(Key::Enter));
        assert!(keys.is_down(Key::Left));
        assert!(!keys.is_down(Key::Right));

        keys.set(Key::Enter, false);
        assert!(!keys.is_down(Key::Enter));
        assert!(!keys.is_empty());
    }

    #[test]
    fn test_pressed_is_edge_triggered() {
        let held = KeyState::new().with(Key::Enter);
        let first = InputFrame::fresh(held);
        assert!(first.pressed(Key::Enter));

        let second = first.next(held);
        assert!(second.down(Key::Enter));
        assert!(!second.pressed(Key::Enter));

        let third = second.next(KeyState::new());
        assert!(third.released(Key::Enter));
    }

    #[test]
    fn test_pressed_digit() {
        let frame = InputFrame::fresh(KeyState::new().with(Key::Digit3));
        assert_eq!(frame.pressed_digit(), Some(2));
        assert_eq!(InputFrame::default().pressed_digit(), None);
    }
}
