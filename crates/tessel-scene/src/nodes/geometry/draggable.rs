use bytemuck::{Pod, Zeroable};
use tessel_engine::render::{
    BufferId, BufferKind, DrawCall, GraphicsDevice, Primitive, VertexAttribute, VertexFormat,
    VertexInput,
};

use crate::error::SceneError;
use crate::geometry::{Point2, Segment2};
use crate::state::RenderState;

pub const START_COLOR: [f32; 4] = [0.8, 0.1, 0.1, 1.0];
pub const END_COLOR: [f32; 4] = [0.1, 0.8, 0.1, 1.0];

const NODE: &str = "draggable segment";

/// Interleaved position + colour vertex.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ColorVertex {
    pub position: Point2,
    pub color: [f32; 4],
}

const STRIDE: u64 = std::mem::size_of::<ColorVertex>() as u64;

/// Two-vertex line whose end follows the pointer.
///
/// The buffer is allocated once; moving the end point rewrites only the
/// second vertex's position.
#[derive(Debug)]
pub struct DraggableSegment {
    start: Point2,
    end: Point2,
    visible: bool,
    buffer: Option<BufferId>,
}

impl Default for DraggableSegment {
    fn default() -> Self {
        Self::new(Point2::ORIGIN, Point2::ORIGIN)
    }
}

impl DraggableSegment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self {
            start,
            end,
            visible: true,
            buffer: None,
        }
    }

    pub fn start(&self) -> Point2 {
        self.start
    }

    pub fn end(&self) -> Point2 {
        self.end
    }

    pub fn segment(&self) -> Segment2 {
        Segment2::new(self.start, self.end)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// An invisible segment issues no draw; its children still do.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_created(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), SceneError> {
        if self.buffer.is_some() {
            return Ok(());
        }
        let buffer = device
            .create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&self.vertices()))
            .map_err(|e| SceneError::resource(NODE, e))?;
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Moves the second vertex. Start point and colours stay untouched.
    pub fn update_end_point(&mut self, device: &mut dyn GraphicsDevice, end: Point2) -> Result<(), SceneError> {
        let buffer = self.buffer()?;
        device
            .update_buffer(buffer, STRIDE, bytemuck::bytes_of(&end))
            .map_err(|e| SceneError::resource(NODE, e))?;
        self.end = end;
        Ok(())
    }

    /// Rewrites both vertices in one update.
    pub fn reset_line(&mut self, device: &mut dyn GraphicsDevice, start: Point2, end: Point2) -> Result<(), SceneError> {
        let buffer = self.buffer()?;
        let vertices = [
            ColorVertex { position: start, color: START_COLOR },
            ColorVertex { position: end, color: END_COLOR },
        ];
        device
            .update_buffer(buffer, 0, bytemuck::cast_slice(&vertices))
            .map_err(|e| SceneError::resource(NODE, e))?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &RenderState) {
        let Some(buffer) = self.buffer else { return };
        if !self.visible {
            return;
        }
        let Some(position) = state.position_slot else {
            log::debug!("no position binding active; skipping segment draw");
            return;
        };

        let mut attributes = vec![VertexAttribute {
            slot: position,
            offset: 0,
            format: VertexFormat::Float32x2,
        }];
        if let Some(slot) = state.vertex_color_slot {
            attributes.push(VertexAttribute {
                slot,
                offset: std::mem::size_of::<Point2>() as u64,
                format: VertexFormat::Float32x4,
            });
        }

        device.draw(&DrawCall {
            primitive: Primitive::Lines,
            vertices: VertexInput {
                buffer,
                stride: STRIDE,
                attributes: &attributes,
            },
            indices: None,
            count: 2,
        });
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(buffer) = self.buffer.take() {
            device.delete_buffer(buffer);
        }
    }

    fn vertices(&self) -> [ColorVertex; 2] {
        [
            ColorVertex { position: self.start, color: START_COLOR },
            ColorVertex { position: self.end, color: END_COLOR },
        ]
    }

    fn buffer(&self) -> Result<BufferId, SceneError> {
        self.buffer.ok_or_else(|| SceneError::NotCreated { node: NODE.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::{AttributeSlot, DeviceCommand, RecordingDevice};

    fn read_back(device: &RecordingDevice, segment: &DraggableSegment) -> Vec<ColorVertex> {
        let bytes = device.read_buffer(segment.buffer.unwrap()).unwrap();
        bytes.chunks_exact(24).map(bytemuck::pod_read_unaligned).collect()
    }

    #[test]
    fn vertex_layout_is_24_bytes() {
        assert_eq!(STRIDE, 24);
    }

    #[test]
    fn update_end_point_touches_only_second_position() {
        let mut device = RecordingDevice::new();
        let mut seg = DraggableSegment::new(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0));
        seg.create(&mut device).unwrap();
        let before = read_back(&device, &seg);

        device.clear_commands();
        seg.update_end_point(&mut device, Point2::new(3.0, -2.0)).unwrap();
        let after = read_back(&device, &seg);

        assert_eq!(after[0], before[0]);
        assert_eq!(after[1].position, Point2::new(3.0, -2.0));
        assert_eq!(after[0].color, START_COLOR);
        assert_eq!(after[1].color, END_COLOR);
        assert_eq!(
            device.commands(),
            &[DeviceCommand::UpdateBuffer {
                buffer: seg.buffer.unwrap(),
                offset: 24,
                len: 8
            }]
        );
        assert_eq!(seg.end(), Point2::new(3.0, -2.0));
    }

    #[test]
    fn reset_line_rewrites_both_vertices() {
        let mut device = RecordingDevice::new();
        let mut seg = DraggableSegment::default();
        seg.create(&mut device).unwrap();
        seg.reset_line(&mut device, Point2::new(2.0, 2.0), Point2::new(2.0, 2.0)).unwrap();

        let v = read_back(&device, &seg);
        assert_eq!(v[0].position, Point2::new(2.0, 2.0));
        assert_eq!(v[1].position, Point2::new(2.0, 2.0));
        assert_eq!(device.buffer_len(seg.buffer.unwrap()), Some(48));
    }

    #[test]
    fn update_before_create_fails() {
        let mut device = RecordingDevice::new();
        let mut seg = DraggableSegment::default();
        assert!(matches!(
            seg.update_end_point(&mut device, Point2::ORIGIN),
            Err(SceneError::NotCreated { .. })
        ));
        assert_eq!(seg.end(), Point2::ORIGIN);
    }

    #[test]
    fn hidden_segment_does_not_draw() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(&crate::shaders::VERTEX_COLOR).unwrap();
        device.use_program(program);
        let mut seg = DraggableSegment::default();
        seg.create(&mut device).unwrap();
        let state = RenderState {
            position_slot: Some(AttributeSlot(0)),
            vertex_color_slot: Some(AttributeSlot(1)),
            ..RenderState::default()
        };

        seg.set_visible(false);
        seg.draw(&mut device, &state);
        assert_eq!(device.draws().count(), 0);

        seg.set_visible(true);
        seg.draw(&mut device, &state);
        let draw = device.draws().next().unwrap();
        assert_eq!(draw.primitive, Primitive::Lines);
        assert_eq!(draw.attributes.len(), 2);
        assert_eq!(draw.attributes[1].offset, 8);
    }
}
