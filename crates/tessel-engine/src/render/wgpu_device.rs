use std::collections::HashMap;
use std::num::NonZeroU64;

use slotmap::{SecondaryMap, SlotMap};
use wgpu::util::DeviceExt;

use super::ctx::RenderTarget;
use super::device::{
    BlendState, BufferId, BufferKind, DeviceError, DrawCall, GraphicsDevice, Primitive, ProgramId,
    UniformSlot, UniformValue, VertexAttribute,
};
use super::program::{link_program, ProgramInterface, ProgramSource};
use super::state::{DeviceState, RecordedDraw};

/// Vertices emitted per point; each point is expanded to a two-triangle quad.
const POINT_QUAD_VERTICES: u32 = 6;

const MIN_UNIFORM_RING_BYTES: u64 = 4096;

struct GpuProgram {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    bind_group_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,
}

struct GpuBuffer {
    kind: BufferKind,
    len: u64,
    // wgpu buffers are never empty; zero-length contents keep no allocation.
    buffer: Option<wgpu::Buffer>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    primitive: Primitive,
    blend: BlendState,
    stride: u64,
    attributes: Vec<VertexAttribute>,
}

impl PipelineKey {
    fn of(draw: &RecordedDraw) -> Self {
        Self {
            program: draw.program,
            primitive: draw.primitive,
            blend: draw.blend,
            stride: draw.stride,
            attributes: draw.attributes.clone(),
        }
    }
}

/// Per-frame uniform storage addressed with dynamic offsets.
struct UniformRing {
    buffer: wgpu::Buffer,
    capacity: u64,
    bind_groups: HashMap<ProgramId, wgpu::BindGroup>,
}

/// [`GraphicsDevice`] backed by wgpu.
///
/// Resource calls take effect immediately. Draws are captured with the state
/// they were issued under and encoded into a single render pass by
/// [`WgpuDevice::flush`]. Pipelines are built lazily, one per distinct
/// (program, primitive, blend, vertex layout) combination.
pub struct WgpuDevice {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    uniform_alignment: u64,

    state: DeviceState,
    programs: SecondaryMap<ProgramId, GpuProgram>,
    buffers: SlotMap<BufferId, GpuBuffer>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    ring: Option<UniformRing>,

    pending: Vec<RecordedDraw>,
}

impl WgpuDevice {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, surface_format: wgpu::TextureFormat) -> Self {
        let uniform_alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        Self {
            device,
            queue,
            surface_format,
            uniform_alignment,
            state: DeviceState::default(),
            programs: SecondaryMap::new(),
            buffers: SlotMap::with_key(),
            pipelines: HashMap::new(),
            ring: None,
            pending: Vec::new(),
        }
    }

    /// Drops pending draws without encoding them.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Encodes every pending draw into one pass over `target`, preserving
    /// the existing contents of the color attachment.
    pub fn flush(&mut self, target: &mut RenderTarget<'_>) {
        if self.pending.is_empty() {
            return;
        }
        let draws = std::mem::take(&mut self.pending);

        let offsets = self.stage_uniforms(&draws);
        for draw in &draws {
            self.ensure_pipeline(draw);
        }
        self.ensure_bind_groups(&draws);

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("tessel scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        for (draw, offset) in draws.iter().zip(&offsets) {
            let Some(pipeline) = self.pipelines.get(&PipelineKey::of(draw)) else { continue };
            let Some(vertices) = self.gpu_buffer(draw.vertex_buffer) else { continue };

            rpass.set_pipeline(pipeline);

            if let Some(offset) = offset {
                let bind_group = self
                    .ring
                    .as_ref()
                    .and_then(|ring| ring.bind_groups.get(&draw.program));
                let Some(bind_group) = bind_group else { continue };
                rpass.set_bind_group(0, bind_group, &[*offset]);
            }

            rpass.set_vertex_buffer(0, vertices.slice(..));

            match (draw.primitive, draw.indices) {
                (Primitive::Points, _) => rpass.draw(0..POINT_QUAD_VERTICES, 0..draw.count),
                (_, Some(indices)) => {
                    let Some(index_buffer) = self.gpu_buffer(indices.buffer) else { continue };
                    rpass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    rpass.draw_indexed(0..draw.count, 0, 0..1);
                }
                (_, None) => rpass.draw(0..draw.count, 0..1),
            }
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn gpu_buffer(&self, id: BufferId) -> Option<&wgpu::Buffer> {
        self.buffers.get(id).and_then(|b| b.buffer.as_ref())
    }

    fn allocate(&self, kind: BufferKind, contents: &[u8]) -> Result<Option<wgpu::Buffer>, DeviceError> {
        if contents.is_empty() {
            return Ok(None);
        }

        let max = self.device.limits().max_buffer_size;
        if contents.len() as u64 > max {
            return Err(DeviceError::Allocation {
                message: format!("{} bytes exceeds the device limit of {max}", contents.len()),
            });
        }

        let (label, usage) = match kind {
            BufferKind::Vertex => ("tessel vertex buffer", wgpu::BufferUsages::VERTEX),
            BufferKind::Index => ("tessel index buffer", wgpu::BufferUsages::INDEX),
        };

        Ok(Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents,
            usage: usage | wgpu::BufferUsages::COPY_DST,
        })))
    }

    /// Packs every draw's uniform snapshot into the ring; returns the dynamic
    /// offset of each draw (`None` for programs without a uniform block).
    fn stage_uniforms(&mut self, draws: &[RecordedDraw]) -> Vec<Option<u32>> {
        let mut offsets = Vec::with_capacity(draws.len());
        let mut bytes: Vec<u8> = Vec::new();

        for draw in draws {
            if draw.uniforms.is_empty() {
                offsets.push(None);
                continue;
            }
            offsets.push(Some(bytes.len() as u32));
            bytes.extend_from_slice(bytemuck::cast_slice(&draw.uniforms));
            let padded = align_up(bytes.len() as u64, self.uniform_alignment);
            bytes.resize(padded as usize, 0);
        }

        if bytes.is_empty() {
            return offsets;
        }

        self.ensure_ring(bytes.len() as u64);
        if let Some(ring) = &self.ring {
            self.queue.write_buffer(&ring.buffer, 0, &bytes);
        }
        offsets
    }

    fn ensure_ring(&mut self, required: u64) {
        if self.ring.as_ref().is_some_and(|r| r.capacity >= required) {
            return;
        }

        let capacity = required.next_power_of_two().max(MIN_UNIFORM_RING_BYTES);
        log::debug!("growing uniform ring to {capacity} bytes");

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tessel uniform ring"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        self.ring = Some(UniformRing {
            buffer,
            capacity,
            bind_groups: HashMap::new(),
        });
    }

    fn ensure_bind_groups(&mut self, draws: &[RecordedDraw]) {
        let Some(ring) = self.ring.as_mut() else { return };

        for draw in draws {
            if draw.uniforms.is_empty() || ring.bind_groups.contains_key(&draw.program) {
                continue;
            }
            let Some(layout) = self
                .programs
                .get(draw.program)
                .and_then(|p| p.bind_group_layout.as_ref())
            else {
                continue;
            };
            let block_size = self
                .state
                .interface(draw.program)
                .map(|i| u64::from(i.uniform_block_size))
                .unwrap_or(0);

            let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessel uniform bind group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &ring.buffer,
                        offset: 0,
                        size: NonZeroU64::new(block_size),
                    }),
                }],
            });
            ring.bind_groups.insert(draw.program, bind_group);
        }
    }

    fn ensure_pipeline(&mut self, draw: &RecordedDraw) {
        let key = PipelineKey::of(draw);
        if self.pipelines.contains_key(&key) {
            return;
        }
        let Some(program) = self.programs.get(draw.program) else { return };
        let Some(interface) = self.state.interface(draw.program) else { return };

        let attributes: Vec<wgpu::VertexAttribute> = draw
            .attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format.to_wgpu(),
                offset: a.offset,
                shader_location: a.slot.0,
            })
            .collect();

        let (topology, step_mode) = match draw.primitive {
            Primitive::Points => (wgpu::PrimitiveTopology::TriangleList, wgpu::VertexStepMode::Instance),
            Primitive::Lines => (wgpu::PrimitiveTopology::LineList, wgpu::VertexStepMode::Vertex),
            Primitive::LineStrip => (wgpu::PrimitiveTopology::LineStrip, wgpu::VertexStepMode::Vertex),
            Primitive::Triangles => (wgpu::PrimitiveTopology::TriangleList, wgpu::VertexStepMode::Vertex),
        };

        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("tessel pipeline"),
            layout: Some(&program.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: Some(&interface.vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: draw.stride,
                    step_mode,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &program.fragment,
                entry_point: Some(&interface.fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.surface_format,
                    blend: draw.blend.to_wgpu(),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!(
            "built pipeline #{} ({:?}, blend {})",
            self.pipelines.len() + 1,
            draw.primitive,
            if draw.blend.enabled { "on" } else { "off" }
        );
        self.pipelines.insert(key, pipeline);
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_program(&mut self, source: &ProgramSource<'_>) -> Result<ProgramId, DeviceError> {
        let interface = link_program(source)?;

        let vertex = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.vertex.into()),
        });
        let fragment = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(source.label),
            source: wgpu::ShaderSource::Wgsl(source.fragment.into()),
        });

        let bind_group_layout = NonZeroU64::new(u64::from(interface.uniform_block_size)).map(|size| {
            self.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tessel uniform bgl"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: Some(size),
                    },
                    count: None,
                }],
            })
        });

        let layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();
        let pipeline_layout = self.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel pipeline layout"),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        let id = self.state.insert_program(source.label, interface);
        self.programs.insert(
            id,
            GpuProgram {
                vertex,
                fragment,
                bind_group_layout,
                pipeline_layout,
            },
        );
        log::debug!("created program '{}' ({id:?})", source.label);
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        if !self.state.remove_program(program) {
            return;
        }
        self.programs.remove(program);
        self.pipelines.retain(|key, _| key.program != program);
        if let Some(ring) = self.ring.as_mut() {
            ring.bind_groups.remove(&program);
        }
    }

    fn use_program(&mut self, program: ProgramId) {
        self.state.use_program(program);
    }

    fn bound_program(&self) -> Option<ProgramId> {
        self.state.bound()
    }

    fn program_interface(&self, program: ProgramId) -> Option<&ProgramInterface> {
        self.state.interface(program)
    }

    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) {
        self.state.set_uniform(slot, value);
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> Result<BufferId, DeviceError> {
        let buffer = self.allocate(kind, contents)?;
        Ok(self.buffers.insert(GpuBuffer {
            kind,
            len: contents.len() as u64,
            buffer,
        }))
    }

    fn upload_buffer(&mut self, buffer: BufferId, contents: &[u8]) -> Result<(), DeviceError> {
        let kind = self.buffers.get(buffer).ok_or(DeviceError::UnknownBuffer)?.kind;
        let fresh = self.allocate(kind, contents)?;
        if let Some(entry) = self.buffers.get_mut(buffer) {
            entry.buffer = fresh;
            entry.len = contents.len() as u64;
        }
        Ok(())
    }

    fn update_buffer(&mut self, buffer: BufferId, offset: u64, data: &[u8]) -> Result<(), DeviceError> {
        let entry = self.buffers.get(buffer).ok_or(DeviceError::UnknownBuffer)?;
        let len = data.len() as u64;
        if offset + len > entry.len {
            return Err(DeviceError::OutOfBounds {
                offset,
                len,
                size: entry.len,
            });
        }
        if let Some(gpu) = &entry.buffer {
            self.queue.write_buffer(gpu, offset, data);
        }
        Ok(())
    }

    fn buffer_len(&self, buffer: BufferId) -> Option<u64> {
        self.buffers.get(buffer).map(|b| b.len)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(buffer);
    }

    fn blend_state(&self) -> BlendState {
        self.state.blend()
    }

    fn set_blend_state(&mut self, state: BlendState) {
        self.state.set_blend(state);
    }

    fn draw(&mut self, call: &DrawCall<'_>) {
        if let Some(draw) = self.state.capture(call) {
            self.pending.push(draw);
        }
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up(13, 1), 13);
    }
}
