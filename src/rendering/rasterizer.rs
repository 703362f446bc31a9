/// Triangle pass: parallel transform, then depth-tested rasterization
/// Rasterization runs on the calling thread, or across disjoint framebuffer
/// stripes when more than one stripe is configured. Every stripe draws its
/// triangles in input order, so the result matches the sequential path.
use super::barycentric;
use super::framebuffer::{Framebuffer, PixelTarget};
use super::scanline;
use super::transform::{transform_triangles, TransformPipeline};
use super::triangle::{ScreenTriangle, Triangle};
use crate::camera::Camera;
use crate::config::{RasterizerKind, TriangleConfig};
use crate::count_add;
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use rayon::prelude::*;
use std::time::Instant;

/// Selects one of the two interchangeable fill algorithms.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rasterizer {
    pub kind: RasterizerKind,
}

impl Rasterizer {
    pub fn new(kind: RasterizerKind) -> Self {
        Self { kind }
    }

    #[inline]
    pub fn rasterize<T: PixelTarget>(&self, triangle: &ScreenTriangle<'_>, target: &mut T) {
        match self.kind {
            RasterizerKind::Scanline => scanline::rasterize(triangle, target),
            RasterizerKind::Barycentric => barycentric::rasterize(triangle, target),
        }
    }

    /// Draw `triangles` in order into `target`.
    pub fn rasterize_all<T: PixelTarget>(&self, triangles: &[ScreenTriangle<'_>], target: &mut T) {
        for triangle in triangles {
            self.rasterize(triangle, target);
        }
    }
}

/// Per-call summary of the triangle pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TrianglePassStats {
    pub submitted: usize,
    pub behind_camera: usize,
    pub off_screen: usize,
    pub rasterized: usize,
    pub transform_us: u64,
    pub raster_us: u64,
}

/// Transforms and rasterizes triangle lists against one camera.
#[derive(Clone, Debug, Default)]
pub struct TriangleRenderer {
    config: TriangleConfig,
}

impl TriangleRenderer {
    pub fn new(config: TriangleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TriangleConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut TriangleConfig {
        &mut self.config
    }

    /// Draw `triangles` over whatever `framebuffer` already holds, keeping a
    /// pixel only where the new depth is strictly nearer.
    pub fn render(&self, camera: &Camera, triangles: &[Triangle<'_>], framebuffer: &mut Framebuffer) -> TrianglePassStats {
        let transform_start = Instant::now();
        let pipeline = TransformPipeline::new(camera, &self.config, framebuffer.width(), framebuffer.height());
        let batch = transform_triangles(&pipeline, triangles);
        let transform_us = transform_start.elapsed().as_micros() as u64;

        let raster_start = Instant::now();
        let rasterizer = Rasterizer::new(self.config.rasterizer);
        let stripes = self.config.raster_stripes.max(1);
        if stripes == 1 {
            let mut slice = framebuffer.as_full_slice_mut();
            rasterizer.rasterize_all(&batch.triangles, &mut slice);
        } else {
            rasterize_striped(&rasterizer, &batch.triangles, framebuffer, stripes);
        }
        let raster_us = raster_start.elapsed().as_micros() as u64;

        count_add!(FUNCTION_COUNTERS.triangles_rasterized, batch.triangles.len() as u64);

        let stats = TrianglePassStats {
            submitted: triangles.len(),
            behind_camera: batch.behind_camera,
            off_screen: batch.off_screen,
            rasterized: batch.triangles.len(),
            transform_us,
            raster_us,
        };
        tracing::debug!(
            rasterizer = ?self.config.rasterizer,
            stripes,
            submitted = stats.submitted,
            behind_camera = stats.behind_camera,
            off_screen = stats.off_screen,
            rasterized = stats.rasterized,
            transform_us,
            raster_us,
            "triangle pass"
        );
        stats
    }
}

/// Row range a triangle can touch, clamped to the screen.
fn row_span(triangle: &ScreenTriangle<'_>, height: usize) -> (usize, usize) {
    let ys = triangle.vertices.map(|v| v.position.y);
    let min_y = ys[0].min(ys[1]).min(ys[2]).max(0.0) as usize;
    let max_y = (ys[0].max(ys[1]).max(ys[2]).max(0.0) as usize).saturating_add(1);
    (min_y.min(height - 1), max_y.min(height - 1))
}

fn rasterize_striped(rasterizer: &Rasterizer, triangles: &[ScreenTriangle<'_>], framebuffer: &mut Framebuffer, stripes: usize) {
    let height = framebuffer.height();
    let stripe_h = height.div_ceil(stripes);
    let slices = framebuffer.split_into_stripes(stripes);

    // Bin by row span; pushing in input order keeps each bin ordered.
    let mut bins: Vec<Vec<usize>> = vec![Vec::new(); slices.len()];
    for (index, triangle) in triangles.iter().enumerate() {
        let (top, bottom) = row_span(triangle, height);
        let last = bins.len() - 1;
        for bin in &mut bins[(top / stripe_h).min(last)..=(bottom / stripe_h).min(last)] {
            bin.push(index);
        }
    }

    let work: Vec<_> = slices
        .into_iter()
        .zip(bins.iter())
        .filter(|(_, bin)| !bin.is_empty())
        .collect();

    work.into_par_iter().for_each(|(mut slice, bin)| {
        for &index in bin {
            rasterizer.rasterize(&triangles[index], &mut slice);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgba8;
    use crate::math::Vector3;

    /// Camera-facing triangle at depth `z` that covers the whole view.
    fn backdrop(z: f64, color: Rgba8) -> Triangle<'static> {
        Triangle::solid(
            Vector3::new(-100.0, -100.0, z),
            Vector3::new(300.0, -100.0, z),
            Vector3::new(-100.0, 300.0, z),
            color,
        )
    }

    #[test]
    fn row_span_is_clamped_to_the_screen() {
        let pipeline = TransformPipeline::new(&Camera::default(), &TriangleConfig::default(), 4, 10);
        let batch = transform_triangles(&pipeline, &[backdrop(5.0, Rgba8::default())]);
        assert_eq!(row_span(&batch.triangles[0], 10), (0, 9));
    }

    #[test]
    fn both_rasterizers_fill_a_screen_covering_triangle() {
        for kind in [RasterizerKind::Scanline, RasterizerKind::Barycentric] {
            let renderer = TriangleRenderer::new(TriangleConfig {
                rasterizer: kind,
                ..TriangleConfig::default()
            });
            let mut fb = Framebuffer::new(8, 6);
            let stats = renderer.render(&Camera::default(), &[backdrop(5.0, Rgba8::rgba(10, 20, 30, 255))], &mut fb);
            assert_eq!(stats.rasterized, 1);

            for y in 0..6 {
                for x in 0..8 {
                    assert_eq!(fb.color_at(x, y), Rgba8::rgba(10, 20, 30, 255), "{kind:?} at ({x}, {y})");
                }
            }
        }
    }
}
