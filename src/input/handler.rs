use macroquad::input::{is_key_down, KeyCode};

use super::{InputFrame, Key, KeyState};

/// Samples the keyboard once per tick
pub struct InputHandler {
    frame: InputFrame,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            frame: InputFrame::default(),
        }
    }

    /// Read the keyboard and return this tick's frame
    pub fn poll(&mut self) -> InputFrame {
        let mut now = KeyState::new();
        for key in Key::ALL {
            now.set(key, is_key_down(key_code(key)));
        }
        self.frame = self.frame.next(now);
        self.frame
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn key_code(key: Key) -> KeyCode {
    match key {
        Key::Up => KeyCode::Up,
        Key::Down => KeyCode::Down,
        Key::Left => KeyCode::Left,
        Key::Right => KeyCode::Right,
        Key::Space => KeyCode::Space,
        Key::Enter => KeyCode::Enter,
        Key::F => KeyCode::F,
        Key::G => KeyCode::G,
        Key::Digit1 => KeyCode::Key1,
        Key::Digit2 => KeyCode::Key2,
        Key::Digit3 => KeyCode::Key3,
        Key::Digit4 => KeyCode::Key4,
        Key::W => KeyCode::W,
        Key::S => KeyCode::S,
    }
}
