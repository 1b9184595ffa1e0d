//! Keyboard handling for spawn/delete requests and overlay control

use macroquad::prelude::*;

/// Edge-detected commands produced by one keyboard poll.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyCommands {
    /// Key 1: request a single dummy
    pub spawn_one: bool,
    /// Key 2: request a batch of dummies
    pub spawn_batch: bool,
    /// Key 3: request deletion of all own dummies
    pub delete_all: bool,
    /// Key O: toggle the diagnostics overlay
    pub toggle_overlay: bool,
    /// Escape: disconnect and quit
    pub quit: bool,
}

/// Samples the keyboard and reports keys that went down this frame.
pub struct InputManager {
    // Previous frame key states for edge detection
    prev_key_1: bool,
    prev_key_2: bool,
    prev_key_3: bool,
    prev_key_o: bool,
    prev_key_escape: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            prev_key_1: false,
            prev_key_2: false,
            prev_key_3: false,
            prev_key_o: false,
            prev_key_escape: false,
        }
    }

    /// Polls the keyboard once. Every command fires on the press edge only,
    /// so holding a key does not spam requests at the server.
    pub fn poll(&mut self) -> KeyCommands {
        let key_1 = is_key_down(KeyCode::Key1);
        let key_2 = is_key_down(KeyCode::Key2);
        let key_3 = is_key_down(KeyCode::Key3);
        let key_o = is_key_down(KeyCode::O);
        let key_escape = is_key_down(KeyCode::Escape);

        let commands = KeyCommands {
            spawn_one: key_1 && !self.prev_key_1,
            spawn_batch: key_2 && !self.prev_key_2,
            delete_all: key_3 && !self.prev_key_3,
            toggle_overlay: key_o && !self.prev_key_o,
            quit: key_escape && !self.prev_key_escape,
        };

        self.prev_key_1 = key_1;
        self.prev_key_2 = key_2;
        self.prev_key_3 = key_3;
        self.prev_key_o = key_o;
        self.prev_key_escape = key_escape;

        commands
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
