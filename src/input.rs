//! Boundary types for the host's input polling. The shell that owns the
//! event loop fills an [`InputSnapshot`] once per frame; nothing in here
//! talks to a windowing library.

use std::collections::HashSet;

use nalgebra::Vector2;

/// The six movement keys the camera understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Cursor state the camera asks the host to apply while look mode is
/// engaged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CursorMode {
    #[default]
    Normal,
    Locked,
}

/// Per-frame snapshot of whatever the host polled since the last frame.
#[derive(Clone, Debug)]
pub struct InputSnapshot {
    /// Mouse movement since the previous snapshot, in pixels.
    pub mouse_delta: Vector2<f32>,
    pub keys: HashSet<Key>,
    pub mouse_buttons: HashSet<MouseButton>,
}

impl Default for InputSnapshot {
    fn default() -> Self {
        Self {
            mouse_delta: Vector2::zeros(),
            keys: HashSet::new(),
            mouse_buttons: HashSet::new(),
        }
    }
}

impl InputSnapshot {
    pub fn key_down(&self, key: Key) -> bool {
        self.keys.contains(&key)
    }

    pub fn mouse_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.contains(&button)
    }
}
