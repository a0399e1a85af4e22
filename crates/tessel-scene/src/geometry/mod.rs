//! Value geometry: points, segments, segment intersection and regular
//! polygon generation. No GPU types in here.

pub mod ngon;
mod point;
mod segment;

pub use point::Point2;
pub use segment::{Segment2, SegmentIntersection, PARALLEL_EPSILON};
