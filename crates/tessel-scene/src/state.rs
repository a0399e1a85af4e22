use tessel_engine::render::{AttributeSlot, UniformSlot};

use crate::geometry::Point2;

/// Column-major 4x4 identity.
pub const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Mutable record threaded through one draw traversal.
///
/// The projection and viewport come from the reshape handler; the binding
/// slots are filled in by whichever shader node was activated last and read
/// by presentation and geometry nodes below it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    /// Column-major orthographic projection.
    pub projection: [f32; 16],
    /// Framebuffer size in pixels.
    pub viewport: [f32; 2],
    pub position_slot: Option<AttributeSlot>,
    pub vertex_color_slot: Option<AttributeSlot>,
    pub projection_slot: Option<UniformSlot>,
    pub material_color_slot: Option<UniformSlot>,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            projection: IDENTITY,
            viewport: [1.0, 1.0],
            position_slot: None,
            vertex_color_slot: None,
            projection_slot: None,
            material_color_slot: None,
        }
    }
}

/// Column-major orthographic projection, GL conventions.
pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> [f32; 16] {
    let mut m = [0.0; 16];
    m[0] = 2.0 / (right - left);
    m[5] = 2.0 / (top - bottom);
    m[10] = -2.0 / (far - near);
    m[12] = -(right + left) / (right - left);
    m[13] = -(top + bottom) / (top - bottom);
    m[14] = -(far + near) / (far - near);
    m[15] = 1.0;
    m
}

/// Visible world rectangle, centered on the origin, fitted to a window.
///
/// The smaller window dimension spans `extent` world units; the larger one
/// grows with the aspect ratio.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct WorldWindow {
    pub half_width: f32,
    pub half_height: f32,
    screen_width: f32,
    screen_height: f32,
}

impl WorldWindow {
    pub fn fit(screen_width: f32, screen_height: f32, extent: f32) -> Self {
        let w = screen_width.max(1.0);
        let h = screen_height.max(1.0);
        let half = extent * 0.5;
        let (half_width, half_height) = if w <= h {
            (half, half * h / w)
        } else {
            (half * w / h, half)
        };
        Self {
            half_width,
            half_height,
            screen_width: w,
            screen_height: h,
        }
    }

    /// Projection with near −1 and far 1.
    pub fn projection(&self) -> [f32; 16] {
        ortho(
            -self.half_width,
            self.half_width,
            -self.half_height,
            self.half_height,
            -1.0,
            1.0,
        )
    }

    /// Maps window coordinates (origin top-left, +Y down) to world units (+Y up).
    pub fn screen_to_world(&self, x: f32, y: f32) -> Point2 {
        let nx = x / self.screen_width * 2.0 - 1.0;
        let ny = 1.0 - y / self.screen_height * 2.0;
        Point2::new(nx * self.half_width, ny * self.half_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(m: &[f32; 16], p: Point2) -> (f32, f32) {
        (m[0] * p.x + m[4] * p.y + m[12], m[1] * p.x + m[5] * p.y + m[13])
    }

    #[test]
    fn smaller_dimension_spans_extent() {
        let wide = WorldWindow::fit(1600.0, 800.0, 10.0);
        assert_eq!(wide.half_height, 5.0);
        assert_eq!(wide.half_width, 10.0);

        let tall = WorldWindow::fit(400.0, 800.0, 10.0);
        assert_eq!(tall.half_width, 5.0);
        assert_eq!(tall.half_height, 10.0);
    }

    #[test]
    fn projection_maps_world_corners_to_ndc() {
        let win = WorldWindow::fit(800.0, 600.0, 10.0);
        let m = win.projection();
        let (x, y) = apply(&m, Point2::new(win.half_width, win.half_height));
        assert!((x - 1.0).abs() < 1e-6 && (y - 1.0).abs() < 1e-6);
        let (x, y) = apply(&m, Point2::ORIGIN);
        assert_eq!((x, y), (0.0, 0.0));
        assert_eq!(m[14], 0.0);
    }

    #[test]
    fn screen_to_world_flips_y() {
        let win = WorldWindow::fit(800.0, 800.0, 10.0);
        assert_eq!(win.screen_to_world(400.0, 400.0), Point2::ORIGIN);
        assert_eq!(win.screen_to_world(0.0, 0.0), Point2::new(-5.0, 5.0));
        assert_eq!(win.screen_to_world(800.0, 800.0), Point2::new(5.0, -5.0));
    }

    #[test]
    fn degenerate_window_does_not_divide_by_zero() {
        let win = WorldWindow::fit(0.0, 0.0, 10.0);
        assert!(win.half_width.is_finite() && win.half_height.is_finite());
    }
}
