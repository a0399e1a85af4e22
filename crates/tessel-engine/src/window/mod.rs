//! Window + runtime loop.
//!
//! Owns the `winit` event loop and the single application window, wires the
//! window to the GPU layer and drives the app at a fixed frame rate.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
