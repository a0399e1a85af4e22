use slotmap::SlotMap;

use super::device::{
    BlendState, BufferId, DrawCall, IndexInput, Primitive, ProgramId, UniformSlot, UniformValue,
    VertexAttribute,
};
use super::program::{ProgramInterface, UniformInfo};

/// Draw captured together with the device state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDraw {
    pub program: ProgramId,
    pub blend: BlendState,
    pub primitive: Primitive,
    pub vertex_buffer: BufferId,
    pub stride: u64,
    pub attributes: Vec<VertexAttribute>,
    pub indices: Option<IndexInput>,
    pub count: u32,
    /// Snapshot of the program's uniform block, one `f32` per 4 bytes.
    pub uniforms: Vec<f32>,
}

impl RecordedDraw {
    /// Values of one uniform member as they were at draw time.
    pub fn uniform(&self, info: &UniformInfo) -> &[f32] {
        let start = (info.offset / 4) as usize;
        let end = start + (info.size / 4) as usize;
        self.uniforms.get(start..end).unwrap_or(&[])
    }
}

struct ProgramRecord {
    label: String,
    interface: ProgramInterface,
    uniforms: Vec<f32>,
}

/// Device-global state shared by every [`super::GraphicsDevice`] backend:
/// linked programs with their uniform storage, the bound program and the
/// blend configuration.
#[derive(Default)]
pub(crate) struct DeviceState {
    programs: SlotMap<ProgramId, ProgramRecord>,
    bound: Option<ProgramId>,
    blend: BlendState,
}

impl DeviceState {
    pub fn insert_program(&mut self, label: &str, interface: ProgramInterface) -> ProgramId {
        let words = (interface.uniform_block_size / 4) as usize;
        self.programs.insert(ProgramRecord {
            label: label.to_string(),
            interface,
            uniforms: vec![0.0; words],
        })
    }

    pub fn remove_program(&mut self, program: ProgramId) -> bool {
        if self.bound == Some(program) {
            self.bound = None;
        }
        self.programs.remove(program).is_some()
    }

    pub fn contains_program(&self, program: ProgramId) -> bool {
        self.programs.contains_key(program)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn use_program(&mut self, program: ProgramId) -> bool {
        if !self.programs.contains_key(program) {
            log::warn!("use_program: handle {program:?} is not a live program");
            return false;
        }
        self.bound = Some(program);
        true
    }

    pub fn bound(&self) -> Option<ProgramId> {
        self.bound
    }

    pub fn interface(&self, program: ProgramId) -> Option<&ProgramInterface> {
        self.programs.get(program).map(|p| &p.interface)
    }

    pub fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) -> bool {
        let Some(record) = self.bound.and_then(|id| self.programs.get_mut(id)) else {
            log::warn!("set_uniform: no program bound, {slot:?} ignored");
            return false;
        };

        let Some(info) = record.interface.uniform_info(slot) else {
            log::warn!("set_uniform: '{}' has no uniform {slot:?}", record.label);
            return false;
        };

        if info.size != value.size() {
            log::warn!(
                "set_uniform: '{}' expects {} bytes for '{}', got {}",
                record.label,
                info.size,
                info.name,
                value.size()
            );
            return false;
        }

        let start = (info.offset / 4) as usize;
        let floats = value.as_floats();
        record.uniforms[start..start + floats.len()].copy_from_slice(floats);
        true
    }

    pub fn blend(&self) -> BlendState {
        self.blend
    }

    pub fn set_blend(&mut self, state: BlendState) {
        self.blend = state;
    }

    /// Snapshots `call` with the bound program, its uniforms and the blend
    /// state. Returns `None` when no program is bound.
    pub fn capture(&self, call: &DrawCall<'_>) -> Option<RecordedDraw> {
        let Some((program, record)) = self.bound.and_then(|id| Some((id, self.programs.get(id)?))) else {
            log::warn!("draw: no program bound, {:?} draw skipped", call.primitive);
            return None;
        };

        Some(RecordedDraw {
            program,
            blend: self.blend,
            primitive: call.primitive,
            vertex_buffer: call.vertices.buffer,
            stride: call.vertices.stride,
            attributes: call.vertices.attributes.to_vec(),
            indices: call.indices,
            count: call.count,
            uniforms: record.uniforms.clone(),
        })
    }
}
