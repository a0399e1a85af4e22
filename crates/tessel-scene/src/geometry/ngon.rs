//! Regular polygon generation.
//!
//! Rendered triangles and perimeter edges both come from
//! [`perimeter_point`], so the edges used for hit-testing always match what
//! is on screen.

use std::f32::consts::TAU;

use super::{Point2, Segment2};

pub const MIN_SIDES: u32 = 3;

/// Clamps a requested side count to [`MIN_SIDES`], warning when it had to.
pub fn clamp_sides(requested: u32) -> u32 {
    if requested < MIN_SIDES {
        log::warn!("n-gon needs at least {MIN_SIDES} sides, got {requested}; using {MIN_SIDES}");
        return MIN_SIDES;
    }
    requested
}

/// Perimeter vertex `i` of an `n`-gon: angle `2π·i/n` from +X, counter-clockwise.
#[inline]
pub fn perimeter_point(center: Point2, radius: f32, i: u32, n: u32) -> Point2 {
    let angle = TAU * i as f32 / n as f32;
    Point2::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
}

/// Triangle fan: vertex 0 is the center, vertices `1..=n` the perimeter.
/// Triangle `i` is `(0, i + 1, (i + 1) % n + 1)`.
pub fn fan(center: Point2, radius: f32, sides: u32) -> (Vec<Point2>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(sides as usize + 1);
    vertices.push(center);
    vertices.extend((0..sides).map(|i| perimeter_point(center, radius, i, sides)));

    let indices = (0..sides)
        .flat_map(|i| [0, i + 1, (i + 1) % sides + 1])
        .collect();

    (vertices, indices)
}

/// Edge `i` runs from perimeter point `i` to point `(i + 1) % n`.
pub fn perimeter_edges(center: Point2, radius: f32, sides: u32) -> Vec<Segment2> {
    (0..sides)
        .map(|i| {
            Segment2::new(
                perimeter_point(center, radius, i, sides),
                perimeter_point(center, radius, (i + 1) % sides, sides),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point2, b: Point2) -> bool {
        a.distance(b) < 1e-5
    }

    #[test]
    fn fan_sizes_for_many_side_counts() {
        for n in MIN_SIDES..40 {
            let (v, i) = fan(Point2::new(1.0, -2.0), 0.7, n);
            assert_eq!(v.len() as u32, n + 1);
            assert_eq!(i.len() as u32, 3 * n);
            assert_eq!(perimeter_edges(Point2::ORIGIN, 1.0, n).len() as u32, n);
            assert!(i.iter().all(|&idx| idx <= n));
        }
    }

    #[test]
    fn fan_triangles_wrap_to_first_perimeter_vertex() {
        let (_, indices) = fan(Point2::ORIGIN, 1.0, 4);
        assert_eq!(indices, vec![0, 1, 2, 0, 2, 3, 0, 3, 4, 0, 4, 1]);
    }

    #[test]
    fn hexagon_edge_zero() {
        let edges = perimeter_edges(Point2::ORIGIN, 1.0, 6);
        assert_eq!(edges.len(), 6);
        assert!(close(edges[0].start, Point2::new(1.0, 0.0)));
        assert!(close(edges[0].end, Point2::new(0.5, 3f32.sqrt() / 2.0)));
    }

    #[test]
    fn edges_follow_rendered_vertices() {
        let center = Point2::new(2.5, 2.5);
        let (vertices, _) = fan(center, 0.6, 8);
        let edges = perimeter_edges(center, 0.6, 8);
        for (i, edge) in edges.iter().enumerate() {
            assert_eq!(edge.start, vertices[i + 1]);
            assert_eq!(edge.end, vertices[(i + 1) % 8 + 1]);
        }
    }

    #[test]
    fn edge_endpoints_sit_on_expected_angles() {
        let n = 7;
        let edges = perimeter_edges(Point2::ORIGIN, 2.0, n);
        for (i, edge) in edges.iter().enumerate() {
            let a0 = TAU * i as f32 / n as f32;
            let a1 = TAU * ((i as u32 + 1) % n) as f32 / n as f32;
            assert!(close(edge.start, Point2::new(2.0 * a0.cos(), 2.0 * a0.sin())));
            assert!(close(edge.end, Point2::new(2.0 * a1.cos(), 2.0 * a1.sin())));
        }
    }

    #[test]
    fn negative_radius_mirrors_through_center() {
        let pos = perimeter_edges(Point2::ORIGIN, 1.0, 5);
        let neg = perimeter_edges(Point2::ORIGIN, -1.0, 5);
        for (p, n) in pos.iter().zip(&neg) {
            assert!(close(p.start, n.start * -1.0));
        }
    }

    #[test]
    fn side_count_below_minimum_is_clamped() {
        assert_eq!(clamp_sides(0), 3);
        assert_eq!(clamp_sides(2), 3);
        assert_eq!(clamp_sides(3), 3);
        assert_eq!(clamp_sides(12), 12);
    }
}
