//! Fixed-rate redraw scheduling.

mod pacer;

pub use pacer::FramePacer;
