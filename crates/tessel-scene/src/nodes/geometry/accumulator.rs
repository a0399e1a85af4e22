use tessel_engine::render::{GraphicsDevice, Primitive};

use crate::error::SceneError;
use crate::geometry::Point2;
use crate::state::RenderState;

use super::VertexList;

/// Disconnected points, added one at a time.
#[derive(Debug, Default)]
pub struct PointAccumulator {
    vertices: VertexList,
}

impl PointAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the (empty) vertex buffer.
    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), SceneError> {
        self.vertices.create(device, "point accumulator")
    }

    pub fn is_created(&self) -> bool {
        self.vertices.buffer().is_some()
    }

    /// Appends a point and re-uploads every point so far.
    pub fn add(&mut self, device: &mut dyn GraphicsDevice, point: Point2) -> Result<(), SceneError> {
        self.vertices.push(device, "point accumulator", point)
    }

    pub fn points(&self) -> &[Point2] {
        self.vertices.points()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() == 0
    }

    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &RenderState) {
        self.vertices.draw(device, state, Primitive::Points);
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.vertices.destroy(device);
    }
}

/// Connected strip through points in insertion order. Needs two points to draw.
#[derive(Debug, Default)]
pub struct PolylineAccumulator {
    vertices: VertexList,
}

impl PolylineAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, device: &mut dyn GraphicsDevice) -> Result<(), SceneError> {
        self.vertices.create(device, "polyline accumulator")
    }

    pub fn is_created(&self) -> bool {
        self.vertices.buffer().is_some()
    }

    pub fn add(&mut self, device: &mut dyn GraphicsDevice, point: Point2) -> Result<(), SceneError> {
        self.vertices.push(device, "polyline accumulator", point)
    }

    pub fn points(&self) -> &[Point2] {
        self.vertices.points()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.len() == 0
    }

    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &RenderState) {
        self.vertices.draw(device, state, Primitive::LineStrip);
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.vertices.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_engine::render::{AttributeSlot, DeviceError, RecordingDevice};

    fn state() -> RenderState {
        RenderState {
            position_slot: Some(AttributeSlot(0)),
            ..RenderState::default()
        }
    }

    fn bound_device() -> RecordingDevice {
        let mut device = RecordingDevice::new();
        let program = device.create_program(&crate::shaders::BASIC).unwrap();
        device.use_program(program);
        device
    }

    #[test]
    fn buffer_tracks_logical_list() {
        let mut device = RecordingDevice::new();
        let mut acc = PointAccumulator::new();
        acc.create(&mut device).unwrap();

        acc.add(&mut device, Point2::new(1.0, 2.0)).unwrap();
        acc.add(&mut device, Point2::new(-3.0, 0.5)).unwrap();

        let buffer = acc.vertices.buffer().unwrap();
        assert_eq!(device.read_floats(buffer).unwrap(), vec![1.0, 2.0, -3.0, 0.5]);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn add_before_create_is_rejected() {
        let mut device = RecordingDevice::new();
        let mut acc = PolylineAccumulator::new();
        let err = acc.add(&mut device, Point2::ORIGIN).unwrap_err();
        assert!(matches!(err, SceneError::NotCreated { .. }));
        assert!(acc.is_empty());
    }

    #[test]
    fn point_accumulator_draws_from_one_point() {
        let mut device = bound_device();
        let mut acc = PointAccumulator::new();
        acc.create(&mut device).unwrap();

        acc.draw(&mut device, &state());
        assert_eq!(device.draws().count(), 0);

        acc.add(&mut device, Point2::ORIGIN).unwrap();
        acc.draw(&mut device, &state());
        let draw = device.draws().last().unwrap();
        assert_eq!(draw.primitive, Primitive::Points);
        assert_eq!(draw.count, 1);
    }

    #[test]
    fn polyline_needs_two_points() {
        let mut device = bound_device();
        let mut line = PolylineAccumulator::new();
        line.create(&mut device).unwrap();

        line.add(&mut device, Point2::new(0.0, 0.0)).unwrap();
        line.draw(&mut device, &state());
        assert_eq!(device.draws().count(), 0);

        line.add(&mut device, Point2::new(1.0, 0.0)).unwrap();
        line.add(&mut device, Point2::new(1.0, 1.0)).unwrap();
        line.draw(&mut device, &state());
        let draw = device.draws().last().unwrap();
        assert_eq!(draw.primitive, Primitive::LineStrip);
        assert_eq!(draw.count, 3);
        assert_eq!(
            device.read_floats(draw.vertex_buffer).unwrap(),
            vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0]
        );
    }

    #[test]
    fn failed_allocation_leaves_node_uncreated() {
        let mut device = RecordingDevice::new();
        device.fail_next_allocations(1);
        let mut acc = PointAccumulator::new();
        let err = acc.create(&mut device).unwrap_err();
        assert!(matches!(
            err,
            SceneError::ResourceCreation {
                source: DeviceError::Allocation { .. },
                ..
            }
        ));
        assert!(!acc.is_created());
    }

    #[test]
    fn failed_upload_rolls_the_point_back() {
        let mut device = RecordingDevice::new();
        let mut acc = PointAccumulator::new();
        acc.create(&mut device).unwrap();
        acc.add(&mut device, Point2::new(1.0, 1.0)).unwrap();

        device.fail_next_uploads(1);
        let err = acc.add(&mut device, Point2::new(2.0, 2.0)).unwrap_err();
        assert!(matches!(err, SceneError::ResourceCreation { .. }));

        let buffer = acc.vertices.buffer().unwrap();
        assert_eq!(acc.points(), &[Point2::new(1.0, 1.0)]);
        assert_eq!(device.buffer_len(buffer), Some(acc.len() as u64 * 8));

        acc.add(&mut device, Point2::new(3.0, 3.0)).unwrap();
        assert_eq!(device.read_floats(buffer).unwrap(), vec![1.0, 1.0, 3.0, 3.0]);
    }

    #[test]
    fn destroy_twice_is_safe() {
        let mut device = RecordingDevice::new();
        let mut acc = PointAccumulator::new();
        acc.create(&mut device).unwrap();
        acc.destroy(&mut device);
        acc.destroy(&mut device);
        assert_eq!(device.live_buffer_count(), 0);
        assert!(!acc.is_created());
    }
}
