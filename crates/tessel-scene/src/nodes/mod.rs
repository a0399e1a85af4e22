//! Node payloads held by the scene graph.

pub mod geometry;
mod presentation;
mod shader;

pub use geometry::{
    DraggableSegment, GeometryNode, NGonNode, PointAccumulator, PolylineAccumulator,
};
pub use presentation::PresentationNode;
pub use shader::{ShaderBindings, ShaderKind, ShaderNode, DEFAULT_POINT_SIZE};
