//! Tessel engine crate.
//!
//! Platform and GPU runtime for the tessel drawing tools: window loop,
//! input translation, frame timing and an immediate-mode graphics device
//! with wgpu and headless backends.

pub mod core;
pub mod coords;
pub mod device;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
