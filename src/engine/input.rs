// Keyboard state tracking for the flock viewer
// Turns winit key events into per-frame "was pressed" queries

use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// What a key press asks the app to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleStats,
    ToggleViewCones,
    TogglePause,
    Reset,
}

impl Action {
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Escape => Some(Self::Quit),
            KeyCode::F3 => Some(Self::ToggleStats),
            KeyCode::F4 => Some(Self::ToggleViewCones),
            KeyCode::Space => Some(Self::TogglePause),
            KeyCode::KeyR => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct InputState {
    keys_held: HashSet<KeyCode>,
    // Keys that went down since the last end_frame(). Auto-repeat is ignored.
    keys_pressed: HashSet<KeyCode>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit WindowEvent into the input state.
    pub fn process_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                self.set_key(key, event.state, event.repeat);
            }
        }
    }

    fn set_key(&mut self, key: KeyCode, state: ElementState, repeat: bool) {
        match state {
            ElementState::Pressed => {
                if !repeat && self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Actions triggered this frame, in no particular order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.keys_pressed.iter().copied().filter_map(Action::from_key)
    }

    /// Call once per frame after actions have been consumed.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
    }
}
