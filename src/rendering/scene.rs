/// Frame orchestration
/// One frame = clear, landscape pass, triangle pass, all into the same
/// framebuffer. The renderers get the framebuffer one after the other.
use super::framebuffer::Framebuffer;
use super::landscape::{Landscape, LandscapeRenderer};
use super::rasterizer::TriangleRenderer;
use super::triangle::Triangle;
use crate::camera::Camera;
use crate::config::RenderConfig;
use crate::image::Rgba8;
use crate::perf::FrameStats;
use std::time::Instant;

/// Everything one frame reads. Borrowed for the duration of the frame.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub camera: Camera,
    pub landscape: Option<Landscape<'a>>,
    pub triangles: &'a [Triangle<'a>],
}

impl<'a> Scene<'a> {
    pub fn new(camera: Camera) -> Self {
        Self {
            camera,
            landscape: None,
            triangles: &[],
        }
    }

    pub fn with_landscape(mut self, landscape: Landscape<'a>) -> Self {
        self.landscape = Some(landscape);
        self
    }

    pub fn with_triangles(mut self, triangles: &'a [Triangle<'a>]) -> Self {
        self.triangles = triangles;
        self
    }
}

/// Both renderers configured from one [`RenderConfig`].
#[derive(Clone, Debug)]
pub struct SceneRenderer {
    pub landscape: LandscapeRenderer,
    pub triangles: TriangleRenderer,
    /// Color the frame is cleared to before any pass runs.
    pub clear_color: Rgba8,
}

impl SceneRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            landscape: LandscapeRenderer::new(config.landscape.clone()),
            triangles: TriangleRenderer::new(config.triangles.clone()),
            clear_color: Rgba8::rgba(0, 0, 0, 255),
        }
    }

    pub fn render(&self, scene: &Scene<'_>, framebuffer: &mut Framebuffer) -> FrameStats {
        let frame_start = Instant::now();
        framebuffer.clear(self.clear_color);

        let mut stats = FrameStats::new();
        if let Some(landscape) = &scene.landscape {
            let start = Instant::now();
            self.landscape.render(&scene.camera, landscape, framebuffer);
            stats.landscape_us = start.elapsed().as_micros() as f64;
        }

        if !scene.triangles.is_empty() {
            let pass = self.triangles.render(&scene.camera, scene.triangles, framebuffer);
            stats.transform_us = pass.transform_us as f64;
            stats.rasterization_us = pass.raster_us as f64;
        }

        stats.total_us = frame_start.elapsed().as_micros() as f64;
        stats
    }
}

impl Default for SceneRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

/// Render one frame of `scene` with a renderer built from `config`.
pub fn render_scene(config: &RenderConfig, scene: &Scene<'_>, framebuffer: &mut Framebuffer) -> FrameStats {
    SceneRenderer::new(config).render(scene, framebuffer)
}
