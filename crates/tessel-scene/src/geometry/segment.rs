use super::Point2;

/// Sine of the angle between two segments below which they are treated as
/// parallel. Relative to both lengths, so it does not depend on world scale.
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// Closed line segment between two points.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Segment2 {
    pub start: Point2,
    pub end: Point2,
}

/// Outcome of [`Segment2::intersect`].
///
/// `t` is the parameter along the receiver, `u` along the argument; both are
/// only meaningful when `intersects` is set.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct SegmentIntersection {
    pub intersects: bool,
    pub point: Point2,
    pub t: f32,
    pub u: f32,
}

impl SegmentIntersection {
    pub const NONE: Self = Self {
        intersects: false,
        point: Point2::ORIGIN,
        t: 0.0,
        u: 0.0,
    };
}

impl Segment2 {
    #[inline]
    pub const fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn direction(&self) -> Point2 {
        self.end - self.start
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.direction().length()
    }

    /// Point at parameter `t` (0 = start, 1 = end).
    #[inline]
    pub fn point_at(&self, t: f32) -> Point2 {
        self.start + self.direction() * t
    }

    /// Parametric segment/segment intersection.
    ///
    /// Both parameters must lie in `[0, 1]`, so touching at an endpoint counts.
    /// Parallel, collinear and zero-length segments never intersect.
    pub fn intersect(&self, other: &Segment2) -> SegmentIntersection {
        let r = self.direction();
        let s = other.direction();
        let denom = r.cross(s);

        if denom.abs() <= PARALLEL_EPSILON * r.length() * s.length() {
            return SegmentIntersection::NONE;
        }

        let qp = other.start - self.start;
        let t = qp.cross(s) / denom;
        let u = qp.cross(r) / denom;

        if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
            return SegmentIntersection::NONE;
        }

        SegmentIntersection {
            intersects: true,
            point: self.point_at(t),
            t,
            u,
        }
    }
}
