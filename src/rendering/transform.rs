/// World -> clip -> screen transform for the triangle pass
/// Triangles are transformed independently, so the pass runs on rayon with
/// input order preserved in the output.
use super::triangle::{ScreenTriangle, ScreenVertex, Triangle};
use crate::camera::Camera;
use crate::config::TriangleConfig;
use crate::count_add;
use crate::math::{self, Matrix4, Vector2, Vector3, VectorExt};
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;
use rayon::prelude::*;

/// What happened to one triangle in the transform stage.
#[derive(Copy, Clone, Debug)]
pub enum TransformOutcome<'a> {
    Visible(ScreenTriangle<'a>),
    /// Some vertex ended up at or behind the camera plane (w <= 0).
    BehindCamera,
    /// Every vertex lies past the same screen edge.
    OffScreen,
}

/// The three per-frame matrices plus the values the cull needs.
#[derive(Clone, Debug)]
pub struct TransformPipeline {
    to_world: Matrix4,
    to_clip: Matrix4,
    to_screen: Matrix4,
    camera_position: Vector3,
    width: f64,
    height: f64,
}

impl TransformPipeline {
    /// # Panics
    /// If either dimension is zero.
    pub fn new(camera: &Camera, config: &TriangleConfig, width: usize, height: usize) -> Self {
        assert!(
            width > 0 && height > 0,
            "triangle transform needs a non-empty target, got {width}x{height}"
        );

        let [ox, oy, oz] = config.mesh_offset;
        let aspect_ratio = width as f64 / height as f64;

        Self {
            to_world: math::translation(ox, oy, oz),
            to_clip: camera.projection_matrix(aspect_ratio, config.z_near, config.z_far) * camera.view_matrix(),
            to_screen: math::screen_space(width as f64 / 2.0, height as f64 / 2.0),
            camera_position: camera.position,
            width: width as f64,
            height: height as f64,
        }
    }

    pub fn transform<'a>(&self, triangle: &Triangle<'a>) -> TransformOutcome<'a> {
        let mut screen = [ScreenVertex::default(); 3];

        for (out, vertex) in screen.iter_mut().zip(triangle.vertices.iter()) {
            let world = math::transform_point4(&self.to_world, vertex.position, vertex.w);
            let clip = self.to_clip * world;
            if clip.w <= 0.0 {
                return TransformOutcome::BehindCamera;
            }

            let projected = self.to_screen * clip;
            *out = ScreenVertex {
                position: Vector2::new(projected.x / projected.w, projected.y / projected.w),
                clip_z: projected.z,
                camera_distance: world.truncate().distance_to(self.camera_position),
                w: projected.w,
                uv: vertex.uv,
            };
        }

        if self.entirely_off_screen(&screen) {
            return TransformOutcome::OffScreen;
        }

        TransformOutcome::Visible(ScreenTriangle::new(screen, triangle.material))
    }

    /// Conservative: only rejects triangles whose vertices are all past one
    /// screen edge.
    fn entirely_off_screen(&self, v: &[ScreenVertex; 3]) -> bool {
        v.iter().all(|p| p.position.x < 0.0)
            || v.iter().all(|p| p.position.y < 0.0)
            || v.iter().all(|p| p.position.x >= self.width)
            || v.iter().all(|p| p.position.y >= self.height)
    }
}

/// Survivors of the transform stage plus the cull tallies.
#[derive(Clone, Debug, Default)]
pub struct TransformedBatch<'a> {
    pub triangles: Vec<ScreenTriangle<'a>>,
    pub behind_camera: usize,
    pub off_screen: usize,
}

/// Transform every triangle in parallel; survivors keep their input order.
pub fn transform_triangles<'a>(pipeline: &TransformPipeline, triangles: &[Triangle<'a>]) -> TransformedBatch<'a> {
    let outcomes: Vec<TransformOutcome<'a>> = triangles.par_iter().map(|t| pipeline.transform(t)).collect();

    let mut batch = TransformedBatch {
        triangles: Vec::with_capacity(outcomes.len()),
        ..TransformedBatch::default()
    };
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            TransformOutcome::Visible(triangle) => batch.triangles.push(triangle),
            TransformOutcome::BehindCamera => {
                tracing::trace!(index, "triangle rejected: vertex behind camera");
                batch.behind_camera += 1;
            }
            TransformOutcome::OffScreen => {
                tracing::trace!(index, "triangle culled: off screen");
                batch.off_screen += 1;
            }
        }
    }

    count_add!(FUNCTION_COUNTERS.triangles_submitted, triangles.len() as u64);
    count_add!(FUNCTION_COUNTERS.triangles_near_rejected, batch.behind_camera as u64);
    count_add!(FUNCTION_COUNTERS.triangles_offscreen_culled, batch.off_screen as u64);

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Rgba8;

    fn camera() -> Camera {
        Camera::new(Vector3::ZERO, Vector3::ZERO, 90.0)
    }

    #[test]
    fn vertex_behind_camera_rejects_whole_triangle() {
        let pipeline = TransformPipeline::new(&camera(), &TriangleConfig::default(), 8, 8);
        let tri = Triangle::solid(
            Vector3::new(-1.0, -1.0, 5.0),
            Vector3::new(1.0, -1.0, 5.0),
            Vector3::new(0.0, 1.0, -1.0),
            Rgba8::rgba(255, 0, 0, 255),
        );
        assert!(matches!(pipeline.transform(&tri), TransformOutcome::BehindCamera));
    }

    #[test]
    fn centered_point_lands_on_screen_center() {
        let pipeline = TransformPipeline::new(&camera(), &TriangleConfig::default(), 8, 8);
        let tri = Triangle::solid(
            Vector3::new(0.0, 0.0, 4.0),
            Vector3::new(1.0, 0.0, 4.0),
            Vector3::new(0.0, 1.0, 4.0),
            Rgba8::default(),
        );
        let TransformOutcome::Visible(screen) = pipeline.transform(&tri) else {
            panic!("triangle in front of the camera should survive");
        };

        let [a, b, c] = screen.vertices;
        assert!((a.position - Vector2::new(3.5, 3.5)).length() < 1e-9);
        // tan(45deg) = 1: one unit at depth 4 spans a quarter of the half-width.
        assert!((b.position.x - 4.5).abs() < 1e-9);
        assert!((c.position.y - 2.5).abs() < 1e-9);
        assert!((a.w - 4.0).abs() < 1e-9);
        assert!((a.camera_distance - 4.0).abs() < 1e-9);
        assert!((b.camera_distance - 17f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn mesh_offset_moves_triangles_into_view() {
        let config = TriangleConfig {
            mesh_offset: [0.0, 0.0, 10.0],
            ..TriangleConfig::default()
        };
        let pipeline = TransformPipeline::new(&camera(), &config, 8, 8);
        let tri = Triangle::solid(
            Vector3::new(-1.0, -1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Rgba8::default(),
        );
        let TransformOutcome::Visible(screen) = pipeline.transform(&tri) else {
            panic!("offset triangle should be visible");
        };
        assert!((screen.vertices[2].camera_distance - 101f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn triangles_past_one_edge_are_culled_and_order_is_kept() {
        let pipeline = TransformPipeline::new(&camera(), &TriangleConfig::default(), 8, 8);
        let visible = |color: u8| {
            Triangle::solid(
                Vector3::new(-1.0, -1.0, 3.0),
                Vector3::new(1.0, -1.0, 3.0),
                Vector3::new(0.0, 1.0, 3.0),
                Rgba8::rgba(color, 0, 0, 255),
            )
        };
        let far_left = Triangle::solid(
            Vector3::new(-30.0, 0.0, 3.0),
            Vector3::new(-20.0, 0.0, 3.0),
            Vector3::new(-25.0, 1.0, 3.0),
            Rgba8::default(),
        );

        let batch = transform_triangles(&pipeline, &[visible(1), far_left, visible(2), visible(3)]);
        assert_eq!(batch.off_screen, 1);
        assert_eq!(batch.behind_camera, 0);
        let reds: Vec<u8> = batch.triangles.iter().map(|t| t.material.base_color.channels[0]).collect();
        assert_eq!(reds, vec![1, 2, 3]);
    }
}
