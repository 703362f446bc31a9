/// Height-field landscape renderer
/// Each screen column is traced independently: rows are marched bottom to
/// top through the height field, and each row resumes from the distance the
/// row below it reached. Columns run in parallel and write into their own
/// span; spans are copied into the framebuffer once all columns are done.
use super::framebuffer::{Framebuffer, SKY_DEPTH};
use super::sampler::{GradientSky, GroundSampler, HeightSampler, SampleFilter, SkySampler};
use crate::camera::Camera;
use crate::config::LandscapeConfig;
use crate::count_add;
use crate::error::{RenderError, RenderResult};
use crate::image::Rgba8;
use crate::math::{self, Matrix4, Vector3, VectorExt};
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use rayon::prelude::*;
use std::time::Instant;

/// The samplers one landscape is read through, borrowed for one frame.
#[derive(Clone, Copy)]
pub struct Landscape<'a> {
    pub heights: &'a dyn HeightSampler,
    pub ground: &'a dyn GroundSampler,
    /// Falls back to [`GradientSky`] when absent.
    pub sky: Option<&'a dyn SkySampler>,
}

impl<'a> Landscape<'a> {
    /// # Panics
    /// If both samplers are grid-backed and their sizes differ.
    pub fn new(heights: &'a dyn HeightSampler, ground: &'a dyn GroundSampler) -> Self {
        match Self::try_new(heights, ground) {
            Ok(landscape) => landscape,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(heights: &'a dyn HeightSampler, ground: &'a dyn GroundSampler) -> RenderResult<Self> {
        if let (Some(h), Some(g)) = (heights.dimensions(), ground.dimensions()) {
            if h != g {
                return Err(RenderError::DimensionMismatch {
                    what: "ground texture",
                    expected: h,
                    found: g,
                });
            }
        }
        Ok(Self {
            heights,
            ground,
            sky: None,
        })
    }

    pub fn with_sky(mut self, sky: &'a dyn SkySampler) -> Self {
        self.sky = Some(sky);
        self
    }
}

/// One traced pixel of a column span.
#[derive(Copy, Clone, Debug, PartialEq)]
struct SpanPixel {
    color: Rgba8,
    depth: f64,
}

#[derive(Default, Clone, Copy)]
struct ColumnStats {
    ray_steps: u64,
    ground_pixels: u64,
    sky_pixels: u64,
}

/// Per-frame constants shared by every column.
struct ColumnSetup<'a> {
    landscape: &'a Landscape<'a>,
    sky: &'a dyn SkySampler,
    config: &'a LandscapeConfig,
    camera_position: Vector3,
    camera_to_world: Matrix4,
    width: f64,
    height: f64,
    tan_half_fov: f64,
    aspect_ratio: f64,
    step_size: f64,
    skip_multiplier: f64,
}

impl<'a> ColumnSetup<'a> {
    #[inline]
    fn ray_direction(&self, x: usize, y: usize) -> Vector3 {
        let sx = (2.0 * ((x as f64 + 0.5) / self.width) - 1.0) * self.tan_half_fov * self.aspect_ratio;
        let sy = (2.0 * ((y as f64 + 0.5) / self.height) - 1.0) * self.tan_half_fov;
        math::transform_direction(&self.camera_to_world, Vector3::new(sx, sy, 1.0)).normalized()
    }

    #[inline]
    fn sky_pixel(&self, direction: Vector3) -> SpanPixel {
        SpanPixel {
            color: self.sky.sky_color(direction),
            depth: SKY_DEPTH,
        }
    }

    /// Trace column `x` into `span`, which is indexed by output row.
    fn trace_column(&self, x: usize, span: &mut [SpanPixel]) -> ColumnStats {
        let rows = span.len();
        let ceiling = self.config.height_ceiling;
        let max_steps = self.config.max_ray_steps as u64;
        let bilinear_height_steps = self.config.bilinear_height_steps as u64;
        let bilinear_color_steps = self.config.bilinear_color_steps as u64;

        let mut stats = ColumnStats::default();
        let mut ray_depth: u64 = 0;
        let mut steps_taken: u64 = 0;
        let mut above_terrain = false;

        for y in 0..rows {
            let out_row = rows - y - 1;
            let direction = self.ray_direction(x, y);

            if above_terrain {
                span[out_row] = self.sky_pixel(direction);
                stats.sky_pixels += 1;
                continue;
            }

            let step = direction * self.step_size;

            // A ray stopped on its first step is clipping into terrain;
            // restart from the camera instead of resuming.
            if steps_taken == 0 {
                ray_depth = 0;
            }
            let mut position = self.camera_position + step * ray_depth as f64;
            steps_taken = 0;

            let mut hit = None;
            while ray_depth < max_steps {
                if position.y > ceiling && step.y > 0.0 {
                    above_terrain = true;
                    break;
                }

                let filter = if ray_depth < bilinear_height_steps {
                    SampleFilter::Bilinear
                } else {
                    SampleFilter::Nearest
                };
                let ground_height = self.landscape.heights.height_at(position.x, position.z, filter);

                if ground_height >= position.y {
                    let filter = if ray_depth < bilinear_color_steps {
                        SampleFilter::Bilinear
                    } else {
                        SampleFilter::Nearest
                    };
                    let color = self.landscape.ground.ground_color(position.x, position.z, filter);
                    if color.alpha() != 0 {
                        hit = Some(SpanPixel {
                            color,
                            depth: position.distance_to(self.camera_position),
                        });
                        break;
                    }
                }

                let extra = (ray_depth as f64 * self.skip_multiplier).floor() as u64;
                position += step * (extra + 1) as f64;
                ray_depth += extra + 1;
                steps_taken += 1;
            }
            stats.ray_steps += steps_taken;

            match hit {
                Some(pixel) => {
                    span[out_row] = pixel;
                    stats.ground_pixels += 1;
                }
                None => {
                    span[out_row] = self.sky_pixel(direction);
                    stats.sky_pixels += 1;
                }
            }
        }

        stats
    }
}

/// Ray-marches a height-field landscape into a framebuffer.
#[derive(Clone, Debug, Default)]
pub struct LandscapeRenderer {
    config: LandscapeConfig,
}

impl LandscapeRenderer {
    pub fn new(config: LandscapeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LandscapeConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut LandscapeConfig {
        &mut self.config
    }

    /// Write every pixel of `framebuffer` with either ground or sky, without
    /// depth testing. Meant to run first in a frame.
    pub fn render(&self, camera: &Camera, landscape: &Landscape<'_>, framebuffer: &mut Framebuffer) {
        let start = Instant::now();
        let width = framebuffer.width();
        let height = framebuffer.height();

        let default_sky = GradientSky::default();
        let sky: &dyn SkySampler = match landscape.sky {
            Some(sky) => sky,
            None => &default_sky,
        };
        let setup = ColumnSetup {
            landscape,
            sky,
            config: &self.config,
            camera_position: camera.position,
            camera_to_world: camera.camera_to_world(),
            width: width as f64,
            height: height as f64,
            tan_half_fov: camera.tan_half_fov(),
            aspect_ratio: framebuffer.aspect_ratio(),
            step_size: self.config.detail.step_size(),
            skip_multiplier: self.config.detail.skip_multiplier(),
        };

        // Column-major scratch: column x owns spans[x * height..(x + 1) * height].
        let mut spans = vec![
            SpanPixel {
                color: Rgba8::default(),
                depth: SKY_DEPTH,
            };
            width * height
        ];

        let stats = spans
            .par_chunks_mut(height)
            .enumerate()
            .map(|(x, span)| setup.trace_column(x, span))
            .reduce(ColumnStats::default, |a, b| ColumnStats {
                ray_steps: a.ray_steps + b.ray_steps,
                ground_pixels: a.ground_pixels + b.ground_pixels,
                sky_pixels: a.sky_pixels + b.sky_pixels,
            });

        for (x, span) in spans.chunks_exact(height).enumerate() {
            for (y, pixel) in span.iter().enumerate() {
                framebuffer.write_pixel(x, y, pixel.color, pixel.depth);
            }
        }

        count_add!(FUNCTION_COUNTERS.landscape_columns_traced, width as u64);
        count_add!(FUNCTION_COUNTERS.landscape_ray_steps, stats.ray_steps);
        count_add!(FUNCTION_COUNTERS.landscape_ground_pixels, stats.ground_pixels);
        count_add!(FUNCTION_COUNTERS.landscape_sky_pixels, stats.sky_pixels);

        tracing::debug!(
            width,
            height,
            detail = ?self.config.detail,
            ray_steps = stats.ray_steps,
            ground_pixels = stats.ground_pixels,
            sky_pixels = stats.sky_pixels,
            elapsed_us = start.elapsed().as_micros() as u64,
            "landscape pass"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetailLevel;
    use crate::image::{Image, Scalar};
    use crate::rendering::sampler::FlatColorSky;
    use std::f64::consts::FRAC_PI_2;
    use std::sync::Mutex;

    /// Constant height and color that remembers every lookup it served.
    struct RecordingSampler {
        height: f64,
        color: Rgba8,
        lookups: Mutex<Vec<(f64, f64, SampleFilter)>>,
    }

    impl RecordingSampler {
        fn new(height: f64, color: Rgba8) -> Self {
            Self {
                height,
                color,
                lookups: Mutex::new(Vec::new()),
            }
        }

        fn lookups(&self) -> Vec<(f64, f64, SampleFilter)> {
            self.lookups.lock().unwrap().clone()
        }
    }

    impl HeightSampler for RecordingSampler {
        fn height_at(&self, x: f64, z: f64, filter: SampleFilter) -> f64 {
            self.lookups.lock().unwrap().push((x, z, filter));
            self.height
        }
    }

    impl GroundSampler for RecordingSampler {
        fn ground_color(&self, x: f64, z: f64, filter: SampleFilter) -> Rgba8 {
            self.lookups.lock().unwrap().push((x, z, filter));
            self.color
        }
    }

    /// One pixel looking straight down +z, so lookup z maps back to ray depth.
    fn level_camera() -> Camera {
        Camera::new(Vector3::new(32.0, 10.0, 32.0), Vector3::ZERO, 90.0)
    }

    fn flat_world(height: f64, color: Rgba8) -> (Image<f64, 1>, Image<u8, 4>) {
        let heights = Image::from_fn(64, 64, |_, _| Scalar::scalar(height));
        let ground = Image::from_fn(64, 64, |_, _| color);
        (heights, ground)
    }

    #[test]
    fn mismatched_sampler_grids_are_rejected() {
        let heights: Image<f64, 1> = Image::new(4, 4);
        let ground: Image<u8, 4> = Image::new(4, 5);
        assert!(matches!(
            Landscape::try_new(&heights, &ground),
            Err(RenderError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn looking_up_above_ceiling_is_all_sky() {
        let (heights, ground) = flat_world(0.0, Rgba8::rgba(0, 255, 0, 255));
        let sky = FlatColorSky(Rgba8::rgba(1, 2, 3, 255));
        let landscape = Landscape::new(&heights, &ground).with_sky(&sky);

        let camera = Camera::new(Vector3::new(32.0, 300.0, 32.0), Vector3::new(FRAC_PI_2 - 0.1, 0.0, 0.0), 60.0);
        let mut fb = Framebuffer::new(8, 8);
        LandscapeRenderer::default().render(&camera, &landscape, &mut fb);

        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(fb.color_at(x, y), Rgba8::rgba(1, 2, 3, 255));
                assert_eq!(fb.depth_at(x, y), SKY_DEPTH);
            }
        }
    }

    #[test]
    fn transparent_ground_shows_sky() {
        let (heights, ground) = flat_world(10.0, Rgba8::rgba(50, 50, 50, 0));
        let sky = FlatColorSky(Rgba8::rgba(9, 9, 9, 255));
        let landscape = Landscape::new(&heights, &ground).with_sky(&sky);

        let mut config = LandscapeConfig::default();
        config.max_ray_steps = 2_000;
        let camera = Camera::new(Vector3::new(32.0, 20.0, 32.0), Vector3::new(-FRAC_PI_2, 0.0, 0.0), 90.0);
        let mut fb = Framebuffer::new(4, 4);
        LandscapeRenderer::new(config).render(&camera, &landscape, &mut fb);

        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(fb.color_at(x, y), Rgba8::rgba(9, 9, 9, 255));
                assert_eq!(fb.depth_at(x, y), SKY_DEPTH);
            }
        }
    }

    #[test]
    fn horizon_splits_ground_and_sky() {
        let (heights, ground) = flat_world(0.0, Rgba8::rgba(0, 200, 0, 255));
        let landscape = Landscape::new(&heights, &ground);

        let config = LandscapeConfig {
            detail: DetailLevel::Low,
            max_ray_steps: 20_000,
            ..LandscapeConfig::default()
        };
        let camera = Camera::new(Vector3::new(32.0, 5.0, 32.0), Vector3::ZERO, 90.0);
        let mut fb = Framebuffer::new(6, 6);
        LandscapeRenderer::new(config).render(&camera, &landscape, &mut fb);

        for x in 0..6 {
            // Bottom rows see the ground, top rows look above the horizon.
            assert_eq!(fb.color_at(x, 5), Rgba8::rgba(0, 200, 0, 255));
            assert!(fb.depth_at(x, 5) < SKY_DEPTH);
            assert_eq!(fb.depth_at(x, 0), SKY_DEPTH);
            assert_eq!(fb.color_at(x, 0), GradientSky::default().sky_color(setup_dir(&camera, &fb, x, 5)));
        }
    }

    #[test]
    fn near_samples_are_bilinear_and_far_samples_nearest() {
        // Every height is a hit, but the ground is transparent, so the ray
        // keeps marching and both samplers see every step.
        let heights = RecordingSampler::new(1e9, Rgba8::default());
        let ground = RecordingSampler::new(0.0, Rgba8::rgba(10, 10, 10, 0));
        let landscape = Landscape::new(&heights, &ground);

        let config = LandscapeConfig {
            detail: DetailLevel::Lowest,
            max_ray_steps: 8,
            bilinear_height_steps: 3,
            bilinear_color_steps: 5,
            ..LandscapeConfig::default()
        };
        let mut fb = Framebuffer::new(1, 1);
        LandscapeRenderer::new(config).render(&level_camera(), &landscape, &mut fb);
        assert_eq!(fb.depth_at(0, 0), SKY_DEPTH);

        let filters = |s: &RecordingSampler| s.lookups().into_iter().map(|(_, _, f)| f).collect::<Vec<_>>();
        let (b, n) = (SampleFilter::Bilinear, SampleFilter::Nearest);
        assert_eq!(filters(&heights), vec![b, b, b, n, n, n, n, n]);
        assert_eq!(filters(&ground), vec![b, b, b, b, b, n, n, n]);
    }

    #[test]
    fn stride_grows_with_ray_depth() {
        let heights = RecordingSampler::new(-1e9, Rgba8::default());
        let ground = RecordingSampler::new(0.0, Rgba8::rgba(0, 255, 0, 255));
        let landscape = Landscape::new(&heights, &ground);

        let detail = DetailLevel::Lowest;
        let config = LandscapeConfig {
            detail,
            max_ray_steps: 2_600,
            ..LandscapeConfig::default()
        };
        let camera = level_camera();
        let mut fb = Framebuffer::new(1, 1);
        LandscapeRenderer::new(config).render(&camera, &landscape, &mut fb);

        let depths: Vec<u64> = heights
            .lookups()
            .iter()
            .map(|&(_, z, _)| ((z - camera.position.z) / detail.step_size()).round() as u64)
            .collect();

        let mut expected = Vec::new();
        let mut depth = 0u64;
        while depth < 2_600 {
            expected.push(depth);
            depth += (depth as f64 * detail.skip_multiplier()).floor() as u64 + 1;
        }

        assert_eq!(depths, expected);
        // Single steps up to depth 2000, then the skip starts doubling them.
        assert!(depths.windows(2).any(|w| w[1] - w[0] == 2));
        assert!(ground.lookups().is_empty());
    }

    #[test]
    fn rows_resume_from_the_row_below_unless_it_hit_immediately() {
        // Looking straight down with a 1x3 view: the bottom row tilts one way,
        // the middle row is vertical and the top row tilts the other way.
        let heights = RecordingSampler::new(0.0, Rgba8::default());
        let ground = Image::from_fn(64, 64, |_, _| Rgba8::rgba(0, 255, 0, 255));
        let landscape = Landscape::new(&heights, &ground);

        let config = LandscapeConfig {
            detail: DetailLevel::Lowest,
            ..LandscapeConfig::default()
        };
        let camera = Camera::new(Vector3::new(32.0, 10.0, 32.0), Vector3::new(-FRAC_PI_2, 0.0, 0.0), 90.0);
        let mut fb = Framebuffer::new(1, 3);
        LandscapeRenderer::new(config).render(&camera, &landscape, &mut fb);

        // The bottom row marches from the camera and hits after `first_hit` steps.
        let step = DetailLevel::Lowest.step_size();
        let first_hit = (fb.depth_at(0, 2) / step).round() as usize;
        assert!(first_hit > 0);

        // The vertical row resumes at that depth and hits on its first sample,
        // instead of marching down from the camera to depth 10.
        assert!((fb.depth_at(0, 1) - first_hit as f64 * step).abs() < 1e-9);

        // Having taken zero steps, it makes the top row restart from the camera.
        let lookups = heights.lookups();
        assert_eq!(lookups.len(), 2 * (first_hit + 1) + 1);
        let (x, z, _) = lookups[first_hit + 2];
        assert!((x - 32.0).abs() < 1e-9 && (z - 32.0).abs() < 1e-9);
        for y in 0..3 {
            assert_eq!(fb.color_at(0, y), Rgba8::rgba(0, 255, 0, 255));
        }
    }

    fn setup_dir(camera: &Camera, fb: &Framebuffer, x: usize, y: usize) -> Vector3 {
        let sx = (2.0 * ((x as f64 + 0.5) / fb.width() as f64) - 1.0) * camera.tan_half_fov() * fb.aspect_ratio();
        let sy = (2.0 * ((y as f64 + 0.5) / fb.height() as f64) - 1.0) * camera.tan_half_fov();
        math::transform_direction(&camera.camera_to_world(), Vector3::new(sx, sy, 1.0)).normalized()
    }
}
