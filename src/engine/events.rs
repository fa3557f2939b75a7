// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Host events delivered to a mounted engine.

use crate::models::shape::ViewportSize;

/// Keys the engine reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Z,
    Y,
    Delete,
    Backspace,
    Escape,
    Other,
}

/// A key press with its modifiers. `command` is Ctrl, or Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub command: bool,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            command: false,
            shift: false,
        }
    }

    pub fn command(key: Key) -> Self {
        Self {
            key,
            command: true,
            shift: false,
        }
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }
}

/// Editing shortcut bound to a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    Delete,
    CancelDraw,
}

impl Shortcut {
    pub fn from_key(press: KeyPress) -> Option<Self> {
        match (press.key, press.command, press.shift) {
            (Key::Z, true, false) => Some(Shortcut::Undo),
            (Key::Z, true, true) | (Key::Y, true, _) => Some(Shortcut::Redo),
            (Key::Delete | Key::Backspace, false, _) => Some(Shortcut::Delete),
            (Key::Escape, _, _) => Some(Shortcut::CancelDraw),
            _ => None,
        }
    }
}

/// Notifications a host forwards from its window, video and timer sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    Key(KeyPress),
    FullscreenChanged(bool),
    Resized(ViewportSize),
    /// Sampled playback position in seconds.
    TimeUpdate(f64),
    PlaybackChanged { playing: bool },
    /// The window lost focus; pointer-up may never arrive.
    FocusLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortcut_bindings() {
        assert_eq!(Shortcut::from_key(KeyPress::command(Key::Z)), Some(Shortcut::Undo));
        assert_eq!(
            Shortcut::from_key(KeyPress::command(Key::Z).with_shift()),
            Some(Shortcut::Redo)
        );
        assert_eq!(Shortcut::from_key(KeyPress::command(Key::Y)), Some(Shortcut::Redo));
        assert_eq!(Shortcut::from_key(KeyPress::new(Key::Delete)), Some(Shortcut::Delete));
        assert_eq!(Shortcut::from_key(KeyPress::new(Key::Escape)), Some(Shortcut::CancelDraw));
        assert_eq!(Shortcut::from_key(KeyPress::new(Key::Z)), None);
        assert_eq!(Shortcut::from_key(KeyPress::new(Key::Other)), None);
    }
}
