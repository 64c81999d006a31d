use std::collections::HashSet;

use super::snapshot::{InputSnapshot, KeyTable, PointerButtons, PointerSample};
use super::types::{
    InputEvent,
    KeyState,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
};

/// Current input state for a single window.
///
/// Holds "is down" information and the current pointer position; the frame
/// loop turns it into an `InputSnapshot` once per frame.
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Pointer position in window pixels.
    pub pointer_pos: Option<(f32, f32)>,

    /// Held keys, by virtual-key code.
    pub keys: KeyTable,

    /// Set of currently held mouse buttons.
    pub buttons_down: HashSet<MouseButton>,
}

impl InputState {
    /// Applies a platform-agnostic input event to the current state.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = *f;
                if !*f {
                    // Releases are not delivered while unfocused; avoid stuck keys.
                    self.keys.clear();
                    self.buttons_down.clear();
                }
            }

            InputEvent::PointerMoved(PointerMoveEvent { x, y }) => {
                self.pointer_pos = Some((*x, *y));
            }

            InputEvent::PointerLeft => {
                self.pointer_pos = None;
            }

            InputEvent::Key { key, state } => {
                if key.code().is_none() {
                    log::trace!("key {key} has no table slot; ignored");
                }
                self.keys.set_key(*key, *state == KeyState::Pressed);
            }

            InputEvent::PointerButton(PointerButtonEvent { button, state, x, y }) => {
                self.pointer_pos = Some((*x, *y));
                match state {
                    MouseButtonState::Pressed => {
                        self.buttons_down.insert(*button);
                    }
                    MouseButtonState::Released => {
                        self.buttons_down.remove(button);
                    }
                }
            }
        }
    }

    pub fn button_down(&self, btn: MouseButton) -> bool {
        self.buttons_down.contains(&btn)
    }

    /// Freezes the current state into the per-frame snapshot.
    pub fn snapshot(&self) -> InputSnapshot {
        let pointer = self.pointer_pos.map(|(x, y)| PointerSample {
            x,
            y,
            buttons: PointerButtons {
                primary: self.button_down(MouseButton::Left),
                secondary: self.button_down(MouseButton::Right),
                middle: self.button_down(MouseButton::Middle),
            },
        });

        InputSnapshot::new(self.keys.clone(), pointer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Key;

    #[test]
    fn snapshot_reflects_held_keys_and_right_drag() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::Key { key: Key::W, state: KeyState::Pressed });
        state.apply_event(&InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Right,
            state: MouseButtonState::Pressed,
            x: 10.0,
            y: 20.0,
        }));
        state.apply_event(&InputEvent::PointerMoved(PointerMoveEvent { x: 12.0, y: 25.0 }));

        let snap = state.snapshot();
        assert!(snap.keys.key_down(Key::W));
        let p = snap.pointer.expect("pointer inside window");
        assert_eq!((p.x, p.y), (12.0, 25.0));
        assert!(p.buttons.secondary);
        assert!(!p.buttons.primary);
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::Key { key: Key::Space, state: KeyState::Pressed });
        state.apply_event(&InputEvent::PointerButton(PointerButtonEvent {
            button: MouseButton::Right,
            state: MouseButtonState::Pressed,
            x: 0.0,
            y: 0.0,
        }));
        state.apply_event(&InputEvent::Focused(false));

        let snap = state.snapshot();
        assert!(!snap.keys.any_down());
        assert!(!snap.pointer.unwrap().buttons.secondary);
    }

    #[test]
    fn pointer_leaving_drops_the_sample() {
        let mut state = InputState::default();
        state.apply_event(&InputEvent::PointerMoved(PointerMoveEvent { x: 1.0, y: 1.0 }));
        state.apply_event(&InputEvent::PointerLeft);
        assert!(state.snapshot().pointer.is_none());
    }
}
