use std::fmt;

use super::program::{ProgramInterface, ProgramSource};

slotmap::new_key_type! {
    /// Handle to a linked shader program owned by a [`GraphicsDevice`].
    pub struct ProgramId;

    /// Handle to a GPU buffer owned by a [`GraphicsDevice`].
    pub struct BufferId;
}

/// Location of a vertex input declared by a program (`@location(n)`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct AttributeSlot(pub u32);

/// Index of a member in a program's uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct UniformSlot(pub u32);

/// Blend factor applied to source or destination color.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
    SrcColor,
    OneMinusSrcColor,
}

impl BlendFactor {
    pub fn to_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
            BlendFactor::SrcColor => wgpu::BlendFactor::Src,
            BlendFactor::OneMinusSrcColor => wgpu::BlendFactor::OneMinusSrc,
        }
    }
}

/// Device-global blending configuration.
///
/// Captured by every draw at submission time, so a draw is rendered with the
/// blend state that was current when it was issued.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendState {
    pub enabled: bool,
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendState {
    /// Straight-alpha "over" blending, enabled.
    pub const ALPHA: Self = Self {
        enabled: true,
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Converts to a wgpu blend descriptor; `None` when blending is disabled.
    pub fn to_wgpu(self) -> Option<wgpu::BlendState> {
        if !self.enabled {
            return None;
        }
        let component = wgpu::BlendComponent {
            src_factor: self.src.to_wgpu(),
            dst_factor: self.dst.to_wgpu(),
            operation: wgpu::BlendOperation::Add,
        };
        Some(wgpu::BlendState {
            color: component,
            alpha: component,
        })
    }
}

impl Default for BlendState {
    fn default() -> Self {
        Self {
            enabled: false,
            src: BlendFactor::SrcAlpha,
            dst: BlendFactor::OneMinusSrcAlpha,
        }
    }
}

/// Primitive topology of a draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
}

impl Primitive {
    /// Smallest vertex (or index) count that produces visible output.
    pub fn min_count(self) -> u32 {
        match self {
            Primitive::Points => 1,
            Primitive::Lines | Primitive::LineStrip => 2,
            Primitive::Triangles => 3,
        }
    }
}

/// Buffer role; decides wgpu usage flags.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    Vertex,
    Index,
}

/// Format of one vertex attribute inside an interleaved vertex buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x4,
}

impl VertexFormat {
    pub fn size(self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x4 => 16,
        }
    }

    pub fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexAttribute {
    pub slot: AttributeSlot,
    pub offset: u64,
    pub format: VertexFormat,
}

/// Vertex source of a draw: one interleaved buffer and its attribute layout.
#[derive(Debug, Copy, Clone)]
pub struct VertexInput<'a> {
    pub buffer: BufferId,
    pub stride: u64,
    pub attributes: &'a [VertexAttribute],
}

/// Index source of a draw. Indices are `u32`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct IndexInput {
    pub buffer: BufferId,
}

/// One draw submission.
///
/// `count` is the number of vertices, or of indices when `indices` is set.
#[derive(Debug, Copy, Clone)]
pub struct DrawCall<'a> {
    pub primitive: Primitive,
    pub vertices: VertexInput<'a>,
    pub indices: Option<IndexInput>,
    pub count: u32,
}

/// Value written to a uniform member.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec4([f32; 4]),
    /// Column-major 4x4 matrix.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub fn as_floats(&self) -> &[f32] {
        match self {
            UniformValue::Float(v) => std::slice::from_ref(v),
            UniformValue::Vec2(v) => v,
            UniformValue::Vec4(v) => v,
            UniformValue::Mat4(v) => v,
        }
    }

    /// Size in bytes of the value as laid out in a uniform block.
    pub fn size(&self) -> u32 {
        (self.as_floats().len() * 4) as u32
    }
}

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Errors reported by a [`GraphicsDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// A shader stage failed to parse or validate.
    Compile {
        label: String,
        stage: ShaderStage,
        message: String,
    },
    /// Both stages compiled but do not form a usable program.
    Link { label: String, message: String },
    /// The device refused to allocate a buffer.
    Allocation { message: String },
    UnknownBuffer,
    OutOfBounds { offset: u64, len: u64, size: u64 },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Compile { label, stage, message } => {
                write!(f, "failed to compile {stage} shader of '{label}':\n{message}")
            }
            DeviceError::Link { label, message } => {
                write!(f, "failed to link program '{label}': {message}")
            }
            DeviceError::Allocation { message } => write!(f, "buffer allocation failed: {message}"),
            DeviceError::UnknownBuffer => write!(f, "buffer handle is not live"),
            DeviceError::OutOfBounds { offset, len, size } => write!(
                f,
                "update of {len} bytes at offset {offset} exceeds buffer size {size}"
            ),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Immediate-mode graphics device.
///
/// Programs and buffers are device-owned and addressed by handles. Blend
/// configuration and the bound program are device-global: they persist until
/// changed and are captured by each [`GraphicsDevice::draw`].
pub trait GraphicsDevice {
    // ── programs ───────────────────────────────────────────────────────────

    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, DeviceError>;

    /// Releases a program. Unknown handles are ignored.
    fn delete_program(&mut self, program: ProgramId);

    fn use_program(&mut self, program: ProgramId);

    fn bound_program(&self) -> Option<ProgramId>;

    fn program_interface(&self, program: ProgramId) -> Option<&ProgramInterface>;

    fn attribute_slot(&self, program: ProgramId, name: &str) -> Option<AttributeSlot> {
        self.program_interface(program)?.attribute(name)
    }

    fn uniform_slot(&self, program: ProgramId, name: &str) -> Option<UniformSlot> {
        self.program_interface(program)?.uniform(name)
    }

    /// Writes a member of the bound program's uniform block.
    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue);

    // ── buffers ────────────────────────────────────────────────────────────

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId, DeviceError>;

    /// Replaces the whole buffer; its size becomes `contents.len()`.
    fn upload_buffer(&mut self, buffer: BufferId, contents: &[u8]) -> Result<(), DeviceError>;

    /// Overwrites `data.len()` bytes at `offset` without reallocating.
    fn update_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError>;

    fn buffer_len(&self, buffer: BufferId) -> Option<u64>;

    /// Releases a buffer. Unknown handles are ignored.
    fn delete_buffer(&mut self, buffer: BufferId);

    // ── blending ───────────────────────────────────────────────────────────

    fn blend_state(&self) -> BlendState;

    fn set_blend_state(&mut self, state: BlendState);

    fn set_blend_enabled(&mut self, enabled: bool) {
        let state = BlendState {
            enabled,
            ..self.blend_state()
        };
        self.set_blend_state(state);
    }

    fn set_blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        let state = BlendState {
            src,
            dst,
            ..self.blend_state()
        };
        self.set_blend_state(state);
    }

    // ── drawing ────────────────────────────────────────────────────────────

    /// Issues a draw with the bound program and the current blend state.
    fn draw(&mut self, call: &DrawCall<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_blend_is_disabled_alpha() {
        let b = BlendState::default();
        assert!(!b.enabled);
        assert_eq!(b.src, BlendFactor::SrcAlpha);
        assert_eq!(b.dst, BlendFactor::OneMinusSrcAlpha);
        assert!(b.to_wgpu().is_none());
    }

    #[test]
    fn enabled_blend_maps_to_wgpu_add() {
        let b = BlendState::ALPHA.to_wgpu().unwrap();
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(b.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(b.alpha.operation, wgpu::BlendOperation::Add);
    }

    #[test]
    fn primitive_minimum_counts() {
        assert_eq!(Primitive::Points.min_count(), 1);
        assert_eq!(Primitive::Lines.min_count(), 2);
        assert_eq!(Primitive::LineStrip.min_count(), 2);
        assert_eq!(Primitive::Triangles.min_count(), 3);
    }

    #[test]
    fn uniform_value_sizes() {
        assert_eq!(UniformValue::Float(1.0).size(), 4);
        assert_eq!(UniformValue::Vec2([0.0; 2]).size(), 8);
        assert_eq!(UniformValue::Vec4([0.0; 4]).size(), 16);
        assert_eq!(UniformValue::Mat4([0.0; 16]).size(), 64);
    }
}
