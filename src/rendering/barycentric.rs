/// Bounding-box barycentric triangle rasterizer
/// Barycentric weights are affine in screen space, so they are evaluated
/// once at the box corner and stepped per pixel. Attributes are interpolated
/// perspective-correctly (divided by w, then by the interpolated 1/w) so the
/// depths written match the scanline rasterizer's.
use super::framebuffer::PixelTarget;
use super::triangle::ScreenTriangle;
use crate::count_call;
use crate::math::Vector3;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;

/// Inclusive integer pixel rectangle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScreenRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScreenRect {
    /// Bounding box of the triangle's vertices, truncated to whole pixels.
    pub fn from_triangle(triangle: &ScreenTriangle<'_>) -> Self {
        let [a, b, c] = triangle.vertices.map(|v| v.position);
        Self {
            left: a.x.min(b.x).min(c.x) as i32,
            top: a.y.min(b.y).min(c.y) as i32,
            right: a.x.max(b.x).max(c.x) as i32,
            bottom: a.y.max(b.y).max(c.y) as i32,
        }
    }

    pub fn clipped_against(&self, other: &ScreenRect) -> Self {
        Self {
            left: self.left.max(other.left),
            top: self.top.max(other.top),
            right: self.right.min(other.right),
            bottom: self.bottom.min(other.bottom),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.right < self.left || self.bottom < self.top
    }

    /// Spans at most two pixels in each direction.
    #[inline]
    pub fn is_sub_pixel(&self) -> bool {
        self.right - self.left <= 1 && self.bottom - self.top <= 1
    }
}

/// Weights of the triangle's vertices at pixel (x, y), or `None` when the
/// triangle's doubled area is below one pixel.
fn barycentric_weights(triangle: &ScreenTriangle<'_>, x: f64, y: f64) -> Option<Vector3> {
    let [p0, p1, p2] = triangle.vertices.map(|v| v.position);
    let e1 = Vector3::new(p2.x - p0.x, p1.x - p0.x, p0.x - x);
    let e2 = Vector3::new(p2.y - p0.y, p1.y - p0.y, p0.y - y);
    let u = e1.cross(e2);

    if u.z.abs() < 1.0 {
        return None;
    }

    let inv_z = 1.0 / u.z;
    Some(Vector3::new(1.0 - (u.x + u.y) * inv_z, u.y * inv_z, u.x * inv_z))
}

/// Rasterize one screen-space triangle with depth testing.
pub fn rasterize<T: PixelTarget>(triangle: &ScreenTriangle<'_>, target: &mut T) {
    let screen = ScreenRect {
        left: 0,
        top: 0,
        right: target.width() as i32 - 1,
        bottom: target.full_height() as i32 - 1,
    };
    let bounds = ScreenRect::from_triangle(triangle).clipped_against(&screen);
    if bounds.is_empty() {
        return;
    }

    let [v0, v1, v2] = triangle.vertices;
    let material = &triangle.material;

    if bounds.is_sub_pixel() {
        let (x, y) = (bounds.left as usize, bounds.top as usize);
        if !target.rows().contains(&y) {
            return;
        }
        let depth = (v0.camera_distance + v1.camera_distance + v2.camera_distance) / 3.0;
        if let Some(index) = target.test_depth_and_get_index(x, y, depth) {
            let uv = (v0.uv + v1.uv + v2.uv) / 3.0;
            target.write_color(index, material.shade(uv.x, uv.y));
        }
        return;
    }

    let corner = |x: i32, y: i32| barycentric_weights(triangle, x as f64, y as f64);
    let (Some(origin), Some(right), Some(below)) = (
        corner(bounds.left, bounds.top),
        corner(bounds.left + 1, bounds.top),
        corner(bounds.left, bounds.top + 1),
    ) else {
        count_call!(FUNCTION_COUNTERS.triangles_degenerate);
        return;
    };
    let x_step = right - origin;
    let y_step = below - origin;

    // Attributes pre-divided by w.
    let inv_w = Vector3::new(1.0 / v0.w, 1.0 / v1.w, 1.0 / v2.w);
    let depth_w = Vector3::new(v0.camera_distance, v1.camera_distance, v2.camera_distance) * inv_w;
    let u_w = Vector3::new(v0.uv.x, v1.uv.x, v2.uv.x) * inv_w;
    let v_w = Vector3::new(v0.uv.y, v1.uv.y, v2.uv.y) * inv_w;

    let rows = target.rows();
    let first_row = bounds.top.max(rows.start as i32);
    let last_row = bounds.bottom.min(rows.end as i32 - 1);

    for y in first_row..=last_row {
        // Row start is evaluated directly so every stripe sees the same weights.
        let mut weights = origin + y_step * (y - bounds.top) as f64;
        let mut span_entered = false;

        for x in bounds.left..=bounds.right {
            let inside = weights.x >= 0.0 && weights.y >= 0.0 && weights.z >= 0.0;
            if !inside {
                if span_entered {
                    break;
                }
                weights += x_step;
                continue;
            }
            span_entered = true;

            let one_over_w = weights.dot(inv_w);
            let depth = weights.dot(depth_w) / one_over_w;
            if let Some(index) = target.test_depth_and_get_index(x as usize, y as usize, depth) {
                let u = weights.dot(u_w) / one_over_w;
                let v = weights.dot(v_w) / one_over_w;
                target.write_color(index, material.shade(u, v));
            }
            weights += x_step;
        }
    }
}
