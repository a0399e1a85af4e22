//! Leaf nodes that own vertex data.
//!
//! Geometry nodes only issue draws. Program, uniforms and blending come from
//! the shader and presentation nodes above them, through [`RenderState`].

mod accumulator;
mod draggable;
mod polygon;

pub use accumulator::{PointAccumulator, PolylineAccumulator};
pub use draggable::{ColorVertex, DraggableSegment, END_COLOR, START_COLOR};
pub use polygon::NGonNode;

use tessel_engine::render::{
    BufferId, BufferKind, DrawCall, GraphicsDevice, IndexInput, Primitive, VertexAttribute,
    VertexFormat, VertexInput,
};

use crate::error::SceneError;
use crate::geometry::Point2;
use crate::state::RenderState;

/// Every geometry node kind.
#[derive(Debug)]
pub enum GeometryNode {
    Points(PointAccumulator),
    Polyline(PolylineAccumulator),
    NGon(NGonNode),
    Segment(DraggableSegment),
}

impl GeometryNode {
    pub fn primitive(&self) -> Primitive {
        match self {
            GeometryNode::Points(_) => Primitive::Points,
            GeometryNode::Polyline(_) => Primitive::LineStrip,
            GeometryNode::NGon(_) => Primitive::Triangles,
            GeometryNode::Segment(_) => Primitive::Lines,
        }
    }

    pub fn is_created(&self) -> bool {
        match self {
            GeometryNode::Points(n) => n.is_created(),
            GeometryNode::Polyline(n) => n.is_created(),
            GeometryNode::NGon(n) => n.is_created(),
            GeometryNode::Segment(n) => n.is_created(),
        }
    }

    /// Issues this node's draw with whatever bindings are active.
    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &RenderState) {
        match self {
            GeometryNode::Points(n) => n.draw(device, state),
            GeometryNode::Polyline(n) => n.draw(device, state),
            GeometryNode::NGon(n) => n.draw(device, state),
            GeometryNode::Segment(n) => n.draw(device, state),
        }
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        match self {
            GeometryNode::Points(n) => n.destroy(device),
            GeometryNode::Polyline(n) => n.destroy(device),
            GeometryNode::NGon(n) => n.destroy(device),
            GeometryNode::Segment(n) => n.destroy(device),
        }
    }
}

impl From<PointAccumulator> for GeometryNode {
    fn from(n: PointAccumulator) -> Self {
        GeometryNode::Points(n)
    }
}

impl From<PolylineAccumulator> for GeometryNode {
    fn from(n: PolylineAccumulator) -> Self {
        GeometryNode::Polyline(n)
    }
}

impl From<NGonNode> for GeometryNode {
    fn from(n: NGonNode) -> Self {
        GeometryNode::NGon(n)
    }
}

impl From<DraggableSegment> for GeometryNode {
    fn from(n: DraggableSegment) -> Self {
        GeometryNode::Segment(n)
    }
}

/// Growable point list mirrored into one vertex buffer.
///
/// Every push re-uploads the whole list, so the buffer always holds exactly
/// `points.len()` vertices.
#[derive(Debug, Default)]
pub(crate) struct VertexList {
    points: Vec<Point2>,
    buffer: Option<BufferId>,
}

impl VertexList {
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn buffer(&self) -> Option<BufferId> {
        self.buffer
    }

    pub fn create(&mut self, device: &mut dyn GraphicsDevice, node: &str) -> Result<(), SceneError> {
        if self.buffer.is_some() {
            return Ok(());
        }
        let buffer = device
            .create_buffer(BufferKind::Vertex, bytemuck::cast_slice(&self.points))
            .map_err(|e| SceneError::resource(node, e))?;
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Appends `point` and re-uploads. On failure the point is dropped again.
    pub fn push(&mut self, device: &mut dyn GraphicsDevice, node: &str, point: Point2) -> Result<(), SceneError> {
        let Some(buffer) = self.buffer else {
            return Err(SceneError::NotCreated { node: node.to_string() });
        };
        self.points.push(point);
        if let Err(e) = device.upload_buffer(buffer, bytemuck::cast_slice(&self.points)) {
            self.points.pop();
            return Err(SceneError::resource(node, e));
        }
        Ok(())
    }

    pub fn draw(&self, device: &mut dyn GraphicsDevice, state: &RenderState, primitive: Primitive) {
        let Some(buffer) = self.buffer else { return };
        draw_positions(device, state, primitive, buffer, None, self.points.len() as u32);
    }

    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(buffer) = self.buffer.take() {
            device.delete_buffer(buffer);
        }
    }
}

/// Draws tightly packed [`Point2`] vertices through the active position slot.
/// Counts below the primitive's minimum draw nothing.
pub(crate) fn draw_positions(
    device: &mut dyn GraphicsDevice,
    state: &RenderState,
    primitive: Primitive,
    buffer: BufferId,
    indices: Option<BufferId>,
    count: u32,
) {
    if count < primitive.min_count() {
        return;
    }
    let Some(slot) = state.position_slot else {
        log::debug!("no position binding active; skipping {primitive:?} draw");
        return;
    };
    let attributes = [VertexAttribute {
        slot,
        offset: 0,
        format: VertexFormat::Float32x2,
    }];
    device.draw(&DrawCall {
        primitive,
        vertices: VertexInput {
            buffer,
            stride: std::mem::size_of::<Point2>() as u64,
            attributes: &attributes,
        },
        indices: indices.map(|buffer| IndexInput { buffer }),
        count,
    });
}
