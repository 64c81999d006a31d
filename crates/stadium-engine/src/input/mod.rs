//! Input subsystem.
//!
//! Event capture belongs to the host. The host either fills an
//! `InputSnapshot` directly or folds platform-agnostic `InputEvent`s into an
//! `InputState` and takes a snapshot once per frame.

mod snapshot;
mod state;
mod types;

pub use snapshot::{InputSnapshot, KeyTable, PointerButtons, PointerSample, KEY_COUNT};
pub use state::InputState;
pub use types::{
    InputEvent,
    Key,
    KeyState,
    MouseButton,
    MouseButtonState,
    PointerButtonEvent,
    PointerMoveEvent,
};
