use tessel_engine::render::{BufferId, BufferKind, GraphicsDevice, Primitive, ResourceGuard};

use crate::error::SceneError;
use crate::geometry::ngon::{clamp_sides, fan, perimeter_edges};
use crate::geometry::{Point2, Segment2};
use crate::state::RenderState;

use super::draw_positions;

const NODE: &str = "n-gon";

/// Regular polygon rendered as an indexed triangle fan.
///
/// The mesh is generated and uploaded once in [`NGonNode::create`] and never
/// changes afterwards.
#[derive(Debug)]
pub struct NGonNode {
    center: Point2,
    radius: f32,
    sides: u32,
    edges: Vec<Segment2>,
    vertex_buffer: Option<BufferId>,
    index_buffer: Option<BufferId>,
}

impl NGonNode {
    /// `sides` below three is clamped with a warning. The radius is not
    /// validated; a negative one mirrors the polygon through its center.
    pub fn new(center: Point2, sides: u32, radius: f32) -> Self {
        let sides = clamp_sides(sides);
        Self {
            center,
            radius,
            sides,
            edges: perimeter_edges(center, radius, sides),
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn center(&self) -> Point2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    /// Edge `i` joins perimeter vertices `i` and `(i + 1) % sides`.
    pub fn perimeter_edges(&self) -> &[Segment2] {
        &self.edges
    }

    pub fn is_created(&self) -> bool {
        self.vertex_buffer.is_some() && self.index_buffer.is_some()
    }

    /// Uploads `sides + 1` vertices and `3 * sides` indices.
    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), SceneError> {
        if self.is_created() {
            return Ok(());
        }
        let (vertices, indices) = fan(self.center, self.radius, self.sides);

        let mut guard = ResourceGuard::new(device);
        let vb = guard
            .create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&vertices))
            .map_err(|e| SceneError::resource(NODE, e))?;
        let ib = guard
            .create_buffer(BufferKind::Index, bytemuck::cast_slice(&indices))
            .map_err(|e| SceneError::resource(NODE, e))?;
        guard.commit();

        log::debug!("{NODE}: {} vertices, {} indices", vertices.len(), indices.len());
        self.vertex_buffer = Some(vb);
        self.index_buffer = Some(ib);
        Ok(())
    }

    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &RenderState) {
        let (Some(vb), Some(ib)) = (self.vertex_buffer, self.index_buffer) else {
            return;
        };
        draw_positions(device, state, Primitive::Triangles, vb, Some(ib), self.sides * 3);
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        for buffer in [self.vertex_buffer.take(), self.index_buffer.take()].into_iter().flatten() {
            device.delete_buffer(buffer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::{AttributeSlot, RecordingDevice};

    #[test]
    fn uploads_fan_once() {
        let mut device = RecordingDevice::new();
        let mut hexagon = NGonNode::new(Point2::ORIGIN, 6, 1.0);
        hexagon.create(&mut device).unwrap();
        hexagon.create(&mut device).unwrap();

        assert_eq!(device.live_buffer_count(), 2);
        let vb = hexagon.vertex_buffer.unwrap();
        let ib = hexagon.index_buffer.unwrap();
        assert_eq!(device.read_floats(vb).unwrap().len(), 7 * 2);
        assert_eq!(device.read_indices(ib).unwrap().len(), 18);
    }

    #[test]
    fn hexagon_edges() {
        let hexagon = NGonNode::new(Point2::ORIGIN, 6, 1.0);
        let edges = hexagon.perimeter_edges();
        assert_eq!(edges.len(), 6);
        assert!(edges[0].start.distance(Point2::new(1.0, 0.0)) < 1e-6);
        assert!(edges[0].end.distance(Point2::new(0.5, 0.866_025_4)) < 1e-6);
    }

    #[test]
    fn too_few_sides_become_a_triangle() {
        let node = NGonNode::new(Point2::new(1.0, 1.0), 2, 0.5);
        assert_eq!(node.sides(), 3);
        assert_eq!(node.perimeter_edges().len(), 3);
    }

    #[test]
    fn failed_index_upload_releases_vertex_buffer() {
        let mut device = RecordingDevice::new();
        device.fail_allocations(1, 1);
        let mut node = NGonNode::new(Point2::ORIGIN, 5, 1.0);

        assert!(node.create(&mut device).is_err());
        assert!(!node.is_created());
        assert_eq!(device.live_buffer_count(), 0);
    }

    #[test]
    fn draws_indexed_triangles() {
        let mut device = RecordingDevice::new();
        let program = device.create_program(&crate::shaders::BASIC).unwrap();
        device.use_program(program);
        let mut node = NGonNode::new(Point2::ORIGIN, 32, 0.4);
        node.create(&mut device).unwrap();

        let state = RenderState {
            position_slot: Some(AttributeSlot(0)),
            ..RenderState::default()
        };
        node.draw(&mut device, &state);
        let draw = device.draws().next().unwrap();
        assert_eq!(draw.primitive, Primitive::Triangles);
        assert_eq!(draw.count, 96);
        assert!(draw.indices.is_some());
    }
}
