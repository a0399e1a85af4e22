//! Retained-mode 2D scene graph on top of `tessel_engine`'s graphics device.
//!
//! - [`geometry`]: points, segments, segment intersection, regular polygons
//! - [`nodes`]: shader, presentation and geometry payloads
//! - [`graph`]: the arena tree and its draw traversal
//! - [`tracker`]: drag-segment intersections against registered polygons

pub mod error;
pub mod geometry;
pub mod graph;
pub mod nodes;
pub mod shaders;
pub mod state;
pub mod tracker;

pub use error::SceneError;
pub use graph::{NodeId, NodeKind, NodePayload, SceneGraph, SceneNode};
pub use state::{RenderState, WorldWindow};
pub use tracker::{IntersectionTracker, TrackerState};
