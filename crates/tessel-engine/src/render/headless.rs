use slotmap::SlotMap;

use super::device::{
    BlendState, BufferId, BufferKind, DeviceError, DrawCall, GraphicsDevice, ProgramId,
    UniformSlot, UniformValue,
};
use super::program::{link_program, ProgramInterface, ProgramSource};
use super::state::{DeviceState, RecordedDraw};

/// Operation observed by a [`RecordingDevice`], in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    UseProgram(ProgramId),
    SetUniform { slot: UniformSlot, value: UniformValue },
    CreateBuffer { buffer: BufferId, kind: BufferKind, len: u64 },
    UploadBuffer { buffer: BufferId, len: u64 },
    UpdateBuffer { buffer: BufferId, offset: u64, len: u64 },
    DeleteBuffer(BufferId),
    SetBlend(BlendState),
    Draw(RecordedDraw),
}

struct HostBuffer {
    kind: BufferKind,
    bytes: Vec<u8>,
}

/// CPU-only [`GraphicsDevice`].
///
/// Programs are compiled and reflected exactly as on the GPU backend. Buffers
/// live in host memory and can be read back; every call is appended to a
/// command log. Allocation and upload failures can be injected to exercise
/// error paths.
#[derive(Default)]
pub struct RecordingDevice {
    state: DeviceState,
    buffers: SlotMap<BufferId, HostBuffer>,
    commands: Vec<DeviceCommand>,
    allocations_before_failure: usize,
    failing_allocations: usize,
    failing_uploads: usize,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` buffer creations fail with [`DeviceError::Allocation`].
    pub fn fail_next_allocations(&mut self, count: usize) {
        self.fail_allocations(0, count);
    }

    /// Lets `after` more buffer creations succeed, then fails the following `count`.
    pub fn fail_allocations(&mut self, after: usize, count: usize) {
        self.allocations_before_failure = after;
        self.failing_allocations = count;
    }

    /// Makes the next `count` full uploads fail with [`DeviceError::Allocation`],
    /// leaving the buffer's previous contents in place.
    pub fn fail_next_uploads(&mut self, count: usize) {
        self.failing_uploads = count;
    }

    pub fn commands(&self) -> &[DeviceCommand] {
        &self.commands
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    /// Draws recorded since the last [`RecordingDevice::clear_commands`].
    pub fn draws(&self) -> impl Iterator<Item = &RecordedDraw> {
        self.commands.iter().filter_map(|c| match c {
            DeviceCommand::Draw(d) => Some(d),
            _ => None,
        })
    }

    pub fn read_buffer(&self, buffer: BufferId) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.bytes.as_slice())
    }

    /// Buffer contents reinterpreted as `f32`s.
    pub fn read_floats(&self, buffer: BufferId) -> Option<Vec<f32>> {
        let bytes = self.read_buffer(buffer)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    pub fn read_indices(&self, buffer: BufferId) -> Option<Vec<u32>> {
        let b = self.buffers.get(buffer)?;
        if b.kind != BufferKind::Index {
            return None;
        }
        Some(
            b.bytes
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    pub fn is_buffer_live(&self, buffer: BufferId) -> bool {
        self.buffers.contains_key(buffer)
    }

    pub fn is_program_live(&self, program: ProgramId) -> bool {
        self.state.contains_program(program)
    }

    pub fn live_buffer_count(&self) -> usize {
        self.buffers.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.program_count()
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, DeviceError> {
        let interface = link_program(source)?;
        let id = self.state.insert_program(source.label, interface);
        self.commands.push(DeviceCommand::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if self.state.remove_program(program) {
            self.commands.push(DeviceCommand::DeleteProgram(program));
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        if self.state.use_program(program) {
            self.commands.push(DeviceCommand::UseProgram(program));
        }
    }

    fn bound_program(&self) -> Option<ProgramId> {
        self.state.bound()
    }

    fn program_interface(&self, program: ProgramId) -> Option<&ProgramInterface> {
        self.state.interface(program)
    }

    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) {
        if self.state.set_uniform(slot, value) {
            self.commands.push(DeviceCommand::SetUniform { slot, value });
        }
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId, DeviceError> {
        if self.allocations_before_failure > 0 {
            self.allocations_before_failure -= 1;
        } else if self.failing_allocations > 0 {
            self.failing_allocations -= 1;
            return Err(DeviceError::Allocation {
                message: format!("injected failure for {} byte {kind:?} buffer", contents.len()),
            });
        }

        let buffer = self.buffers.insert(HostBuffer {
            kind,
            bytes: contents.to_vec(),
        });
        self.commands.push(DeviceCommand::CreateBuffer {
            buffer,
            kind,
            len: contents.len() as u64,
        });
        Ok(buffer)
    }

    fn upload_buffer(&mut self, buffer: BufferId, contents: &[u8]) -> Result<(), DeviceError> {
        let b = self.buffers.get_mut(buffer).ok_or(DeviceError::UnknownBuffer)?;
        if self.failing_uploads > 0 {
            self.failing_uploads -= 1;
            return Err(DeviceError::Allocation {
                message: format!("injected failure re-uploading {} bytes", contents.len()),
            });
        }
        b.bytes.clear();
        b.bytes.extend_from_slice(contents);
        self.commands.push(DeviceCommand::UploadBuffer {
            buffer,
            len: contents.len() as u64,
        });
        Ok(())
    }

    fn update_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let b = self.buffers.get_mut(buffer).ok_or(DeviceError::UnknownBuffer)?;
        let size = b.bytes.len() as u64;
        let len = data.len() as u64;
        if offset + len > size {
            return Err(DeviceError::OutOfBounds { offset, len, size });
        }

        let start = offset as usize;
        b.bytes[start..start + data.len()].copy_from_slice(data);
        self.commands.push(DeviceCommand::UpdateBuffer { buffer, offset, len });
        Ok(())
    }

    fn buffer_len(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(buffer).map(|b| b.bytes.len() as u64)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(buffer).is_some() {
            self.commands.push(DeviceCommand::DeleteBuffer(buffer));
        }
    }

    fn blend_state(&self) -> BlendState {
        self.state.blend()
    }

    fn set_blend_state(&mut self, state: BlendState) {
        self.state.set_blend(state);
        self.commands.push(DeviceCommand::SetBlend(state));
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        if let Some(draw) = self.state.capture(call) {
            self.commands.push(DeviceCommand::Draw(draw));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{AttributeSlot, BlendFactor, Primitive, VertexAttribute, VertexFormat, VertexInput};

    const VS: &str = r#"
struct Uniforms {
    ortho_matrix: mat4x4<f32>,
    color: vec4<f32>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return u.ortho_matrix * vec4<f32>(position, 0.0, 1.0);
}
"#;

    const FS: &str = r#"
struct Uniforms {
    ortho_matrix: mat4x4<f32>,
    color: vec4<f32>,
}
@group(0) @binding(0) var<uniform> u: Uniforms;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.color;
}
"#;

    fn program(dev: &mut RecordingDevice) -> ProgramId {
        dev.create_program(&ProgramSource {
            label: "solid",
            vertex: VS,
            fragment: FS,
        })
        .unwrap()
    }

    const POSITION: [VertexAttribute; 1] = [VertexAttribute {
        slot: AttributeSlot(0),
        offset: 0,
        format: VertexFormat::Float32x2,
    }];

    fn lines(buffer: BufferId, count: u32) -> DrawCall<'static> {
        DrawCall {
            primitive: Primitive::Lines,
            vertices: VertexInput {
                buffer,
                stride: 8,
                attributes: &POSITION,
            },
            indices: None,
            count,
        }
    }

    // ── buffers ────────────────────────────────────────────────────────────

    #[test]
    fn upload_replaces_size_and_contents() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(BufferKind::Vertex, &[1, 2, 3, 4]).unwrap();
        dev.upload_buffer(b, &[9; 12]).unwrap();
        assert_eq!(dev.buffer_len(b), Some(12));
        assert_eq!(dev.read_buffer(b).unwrap(), &[9; 12]);
    }

    #[test]
    fn failed_upload_keeps_previous_contents() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(BufferKind::Vertex, &[1, 2, 3, 4]).unwrap();
        dev.fail_next_uploads(1);
        let err = dev.upload_buffer(b, &[9; 12]).unwrap_err();
        assert!(matches!(err, DeviceError::Allocation { .. }));
        assert_eq!(dev.read_buffer(b).unwrap(), &[1, 2, 3, 4]);

        dev.upload_buffer(b, &[5; 8]).unwrap();
        assert_eq!(dev.buffer_len(b), Some(8));
    }

    #[test]
    fn partial_update_touches_only_its_range() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(BufferKind::Vertex, &[0; 8]).unwrap();
        dev.update_buffer(b, 4, &[7, 7]).unwrap();
        assert_eq!(dev.read_buffer(b).unwrap(), &[0, 0, 0, 0, 7, 7, 0, 0]);
    }

    #[test]
    fn update_past_end_is_rejected() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(BufferKind::Vertex, &[0; 8]).unwrap();
        let err = dev.update_buffer(b, 6, &[1, 2, 3]).unwrap_err();
        assert_eq!(err, DeviceError::OutOfBounds { offset: 6, len: 3, size: 8 });
    }

    #[test]
    fn delete_is_idempotent() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(BufferKind::Index, &[]).unwrap();
        dev.delete_buffer(b);
        dev.delete_buffer(b);
        assert!(!dev.is_buffer_live(b));
        let deletes = dev
            .commands()
            .iter()
            .filter(|c| matches!(c, DeviceCommand::DeleteBuffer(_)))
            .count();
        assert_eq!(deletes, 1);
        assert_eq!(dev.upload_buffer(b, &[1]), Err(DeviceError::UnknownBuffer));
    }

    #[test]
    fn injected_failures_are_consumed() {
        let mut dev = RecordingDevice::new();
        dev.fail_next_allocations(1);
        assert!(matches!(
            dev.create_buffer(BufferKind::Vertex, &[0; 4]),
            Err(DeviceError::Allocation { .. })
        ));
        assert!(dev.create_buffer(BufferKind::Vertex, &[0; 4]).is_ok());
        assert_eq!(dev.live_buffer_count(), 1);
    }

    #[test]
    fn delayed_failure_skips_first_allocations() {
        let mut dev = RecordingDevice::new();
        dev.fail_allocations(1, 1);
        assert!(dev.create_buffer(BufferKind::Vertex, &[0; 4]).is_ok());
        assert!(dev.create_buffer(BufferKind::Index, &[0; 4]).is_err());
        assert!(dev.create_buffer(BufferKind::Index, &[0; 4]).is_ok());
    }

    // ── state capture ──────────────────────────────────────────────────────

    #[test]
    fn draw_captures_uniforms_and_blend() {
        let mut dev = RecordingDevice::new();
        let p = program(&mut dev);
        let b = dev.create_buffer(BufferKind::Vertex, &[0; 16]).unwrap();

        dev.use_program(p);
        let color = dev.uniform_slot(p, "color").unwrap();
        dev.set_uniform(color, UniformValue::Vec4([1.0, 0.0, 0.0, 0.5]));
        dev.set_blend_enabled(true);
        dev.draw(&lines(b, 2));

        dev.set_uniform(color, UniformValue::Vec4([0.0, 1.0, 0.0, 1.0]));
        dev.set_blend_enabled(false);
        dev.draw(&lines(b, 2));

        let info = dev.program_interface(p).unwrap().uniform_info(color).unwrap().clone();
        let draws: Vec<_> = dev.draws().collect();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].uniform(&info), &[1.0, 0.0, 0.0, 0.5]);
        assert!(draws[0].blend.enabled);
        assert_eq!(draws[1].uniform(&info), &[0.0, 1.0, 0.0, 1.0]);
        assert!(!draws[1].blend.enabled);
    }

    #[test]
    fn draw_without_program_is_skipped() {
        let mut dev = RecordingDevice::new();
        let b = dev.create_buffer(BufferKind::Vertex, &[0; 16]).unwrap();
        dev.draw(&lines(b, 2));
        assert_eq!(dev.draws().count(), 0);
    }

    #[test]
    fn deleting_bound_program_unbinds_it() {
        let mut dev = RecordingDevice::new();
        let p = program(&mut dev);
        dev.use_program(p);
        dev.delete_program(p);
        assert_eq!(dev.bound_program(), None);
        assert!(!dev.is_program_live(p));
    }

    #[test]
    fn wrong_sized_uniform_is_ignored() {
        let mut dev = RecordingDevice::new();
        let p = program(&mut dev);
        dev.use_program(p);
        let color = dev.uniform_slot(p, "color").unwrap();
        dev.clear_commands();
        dev.set_uniform(color, UniformValue::Float(1.0));
        assert!(dev.commands().is_empty());
    }

    #[test]
    fn blend_func_keeps_enable_flag() {
        let mut dev = RecordingDevice::new();
        dev.set_blend_enabled(true);
        dev.set_blend_func(BlendFactor::One, BlendFactor::Zero);
        assert_eq!(
            dev.blend_state(),
            BlendState {
                enabled: true,
                src: BlendFactor::One,
                dst: BlendFactor::Zero,
            }
        );
    }
}
