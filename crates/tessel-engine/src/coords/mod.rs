//! Shared value types.

mod color;

pub use color::ColorRgba;
