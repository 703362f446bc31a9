/// Scanline triangle rasterizer
/// Splits each triangle at its middle vertex into a flat-bottomed and a
/// flat-topped half, then walks the two edges of each half row by row.
/// Attributes are carried pre-divided by w and recovered per pixel.
use super::framebuffer::PixelTarget;
use super::triangle::{Material, ScreenTriangle, ScreenVertex};
use crate::count_call;
use crate::math;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;

/// Values interpolated down triangle edges and across spans.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Interpolants {
    pub x: f64,
    /// u / w
    pub u: f64,
    /// v / w
    pub v: f64,
    pub inv_w: f64,
    /// camera distance / w
    pub depth: f64,
}

impl Interpolants {
    /// Add `deltas` to every field once.
    #[inline]
    pub fn step(&mut self, deltas: &Interpolants) {
        self.x += deltas.x;
        self.u += deltas.u;
        self.v += deltas.v;
        self.inv_w += deltas.inv_w;
        self.depth += deltas.depth;
    }

    /// Add `deltas` to every field `times` times in one go.
    #[inline]
    pub fn step_by(&mut self, deltas: &Interpolants, times: f64) {
        self.x += deltas.x * times;
        self.u += deltas.u * times;
        self.v += deltas.v * times;
        self.inv_w += deltas.inv_w * times;
        self.depth += deltas.depth * times;
    }

    fn of(vertex: &ScreenVertex) -> Self {
        let inv_w = 1.0 / vertex.w;
        Self {
            x: vertex.position.x,
            u: vertex.uv.x * inv_w,
            v: vertex.uv.y * inv_w,
            inv_w,
            depth: vertex.camera_distance * inv_w,
        }
    }
}

/// Rasterize one screen-space triangle with depth testing.
pub fn rasterize<T: PixelTarget>(triangle: &ScreenTriangle<'_>, target: &mut T) {
    // Sort by y; "high" is nearest the top of the screen.
    let [mut high, mut mid, mut low] = triangle.vertices;
    if low.position.y < mid.position.y {
        std::mem::swap(&mut low, &mut mid);
    }
    if mid.position.y < high.position.y {
        std::mem::swap(&mut mid, &mut high);
    }
    if low.position.y < mid.position.y {
        std::mem::swap(&mut low, &mut mid);
    }

    if low.position.y == high.position.y {
        count_call!(FUNCTION_COUNTERS.triangles_degenerate);
        return;
    }

    let split_ratio = (mid.position.y - high.position.y) / (low.position.y - high.position.y);
    let split = ScreenVertex {
        position: math::Vector2::new(
            math::lerp(high.position.x, low.position.x, split_ratio),
            mid.position.y,
        ),
        clip_z: math::lerp(high.clip_z, low.clip_z, split_ratio),
        camera_distance: math::lerp(high.camera_distance, low.camera_distance, split_ratio),
        w: math::lerp(high.w, low.w, split_ratio),
        uv: high.uv.lerp(low.uv, split_ratio),
    };

    fill_split_triangle(&high, &mid, &split, &triangle.material, target);
    fill_split_triangle(&low, &mid, &split, &triangle.material, target);
}

/// Fill a triangle whose two base vertices share a row. The peak may be
/// above (up triangle) or below (down triangle) the base.
fn fill_split_triangle<T: PixelTarget>(
    peak: &ScreenVertex,
    base1: &ScreenVertex,
    base2: &ScreenVertex,
    material: &Material<'_>,
    target: &mut T,
) {
    debug_assert!(
        base1.position.y == base2.position.y,
        "split triangle base must be flat"
    );

    let (left, right) = if base1.position.x < base2.position.x {
        (base1, base2)
    } else {
        (base2, base1)
    };

    // Vertices with a tiny w project arbitrarily far off screen, so rows are
    // kept in f64 until they are clamped to the target.
    if !peak.position.y.is_finite() || !base1.position.y.is_finite() {
        return;
    }
    let mut start_row = peak.position.y.trunc();
    let mut end_row = base1.position.y.trunc();
    let is_down = start_row > end_row;
    if is_down {
        std::mem::swap(&mut start_row, &mut end_row);
        // The base row belongs to the up triangle.
        start_row += 1.0;
    } else if start_row == end_row {
        return;
    }

    // Both halves start at their topmost vertex: the peak of an up triangle,
    // the base of a down triangle.
    let tri_height = end_row - start_row + 1.0;
    let edge = |base: &ScreenVertex| {
        let (top, bottom) = if is_down {
            (Interpolants::of(base), Interpolants::of(peak))
        } else {
            (Interpolants::of(peak), Interpolants::of(base))
        };
        let deltas = Interpolants {
            x: (bottom.x - top.x) / tri_height,
            u: (bottom.u - top.u) / tri_height,
            v: (bottom.v - top.v) / tri_height,
            inv_w: (bottom.inv_w - top.inv_w) / tri_height,
            depth: (bottom.depth - top.depth) / tri_height,
        };
        (top, deltas)
    };
    let (mut left_params, left_deltas) = edge(left);
    let (mut right_params, right_deltas) = edge(right);

    if start_row < 0.0 {
        let skipped = -start_row;
        left_params.step_by(&left_deltas, skipped);
        right_params.step_by(&right_deltas, skipped);
        start_row = 0.0;
    }
    end_row = end_row.min((target.full_height() - 1) as f64);
    if start_row > end_row {
        return;
    }

    let rows = target.rows();
    for row in start_row as usize..=end_row as usize {
        left_params.step(&left_deltas);
        right_params.step(&right_deltas);

        if row >= rows.end {
            break;
        }
        if row >= rows.start {
            fill_row(row, &left_params, &right_params, material, target);
        }
    }
}

fn fill_row<T: PixelTarget>(
    row: usize,
    left: &Interpolants,
    right: &Interpolants,
    material: &Material<'_>,
    target: &mut T,
) {
    if right.x < left.x {
        return;
    }

    let row_width = right.x - left.x + 1.0;
    let deltas = Interpolants {
        x: 0.0,
        u: (right.u - left.u) / row_width,
        v: (right.v - left.v) / row_width,
        inv_w: (right.inv_w - left.inv_w) / row_width,
        depth: (right.depth - left.depth) / row_width,
    };

    let mut current = *left;
    if current.x < 0.0 {
        current.step_by(&deltas, current.x.abs().trunc());
        current.x = 0.0;
    }
    let end_x = right.x.min((target.width() - 1) as f64);

    let mut x = current.x as i32;
    while x as f64 <= end_x {
        let depth = current.depth / current.inv_w;
        if let Some(index) = target.test_depth_and_get_index(x as usize, row, depth) {
            let color = material.shade(current.u / current.inv_w, current.v / current.inv_w);
            target.write_color(index, color);
        }
        current.step(&deltas);
        x += 1;
    }
}
