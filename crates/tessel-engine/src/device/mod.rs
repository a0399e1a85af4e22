//! Window-bound GPU context.
//!
//! Owns the wgpu instance, adapter, device and surface for one window, and
//! hands out acquired frames. Drawing goes through [`crate::render`].

mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use init::GpuInit;
