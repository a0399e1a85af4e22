//! Input subsystem.
//!
//! Applications see only the types defined here; `platform` translates winit
//! window events into them.

pub(crate) mod platform;
mod state;
mod types;

pub(crate) use state::InputState;
pub use types::{
    InputEvent, Key, KeyState, Modifiers, MouseButton, MouseButtonState, PointerButtonEvent,
    PointerMoveEvent,
};
