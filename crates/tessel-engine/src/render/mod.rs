//! Rendering subsystem.
//!
//! Exposes an immediate-mode [`GraphicsDevice`] with two backends:
//! - [`WgpuDevice`] records draws and encodes them into the frame's pass
//! - [`RecordingDevice`] keeps everything on the CPU for tests and tools
//!
//! Programs are WGSL and reflected through naga, so vertex attributes and
//! uniform members are looked up by name on either backend.

mod ctx;
mod device;
mod guard;
mod headless;
mod program;
mod state;
mod wgpu_device;

pub use ctx::RenderTarget;
pub use device::{
    AttributeSlot, BlendFactor, BlendState, BufferId, BufferKind, DeviceError, DrawCall,
    GraphicsDevice, IndexInput, Primitive, ProgramId, ShaderStage, UniformSlot, UniformValue,
    VertexAttribute, VertexFormat, VertexInput,
};
pub use guard::ResourceGuard;
pub use headless::{DeviceCommand, RecordingDevice};
pub use program::{link_program, AttributeInfo, ProgramInterface, ProgramSource, UniformInfo};
pub use state::RecordedDraw;
pub use wgpu_device::WgpuDevice;
