/// Camera shared by the landscape ray-marcher and the triangle pipeline
/// Orientation is stored as Euler angles (pitch, yaw, roll) in radians.
/// Camera space is +X right, +Y up, +Z forward.
use crate::math::{self, Matrix4, Vector3, VectorExt};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vector3,
    /// x = pitch (positive looks up), y = yaw, z = roll; radians.
    pub orientation: Vector3,
    /// Divides the tangent of the half field of view; 1.0 is no zoom.
    pub zoom: f64,
    /// Vertical field of view in degrees.
    pub fov: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vector3::ZERO,
            orientation: Vector3::ZERO,
            zoom: 1.0,
            fov: 60.0,
        }
    }
}

impl Camera {
    pub fn new(position: Vector3, orientation: Vector3, fov: f64) -> Self {
        Self {
            position,
            orientation,
            fov,
            ..Self::default()
        }
    }

    #[inline]
    pub fn pitch(&self) -> f64 {
        self.orientation.x
    }

    #[inline]
    pub fn yaw(&self) -> f64 {
        self.orientation.y
    }

    #[inline]
    pub fn roll(&self) -> f64 {
        self.orientation.z
    }

    /// Rotation taking camera-space directions into world space.
    pub fn camera_to_world(&self) -> Matrix4 {
        math::rotation(0.0, self.yaw(), 0.0)
            * math::rotation(-self.pitch(), 0.0, 0.0)
            * math::rotation(0.0, 0.0, self.roll())
    }

    /// Inverse of [`Camera::camera_to_world`]; a pure rotation, so its transpose.
    pub fn world_to_camera(&self) -> Matrix4 {
        self.camera_to_world().transpose()
    }

    /// Full view matrix: inverse rotation composed with inverse translation.
    pub fn view_matrix(&self) -> Matrix4 {
        self.world_to_camera()
            * math::translation(-self.position.x, -self.position.y, -self.position.z)
    }

    /// Tangent of half the vertical field of view, with zoom applied.
    #[inline]
    pub fn tan_half_fov(&self) -> f64 {
        (self.fov.to_radians() / 2.0).tan() / self.zoom
    }

    /// Vertical field of view in radians with zoom applied.
    #[inline]
    pub fn effective_fov(&self) -> f64 {
        2.0 * self.tan_half_fov().atan()
    }

    pub fn projection_matrix(&self, aspect_ratio: f64, z_near: f64, z_far: f64) -> Matrix4 {
        math::perspective(self.effective_fov(), aspect_ratio, z_near, z_far)
    }

    pub fn forward(&self) -> Vector3 {
        math::transform_direction(&self.camera_to_world(), Vector3::Z)
    }

    pub fn right(&self) -> Vector3 {
        math::transform_direction(&self.camera_to_world(), Vector3::X)
    }

    pub fn up(&self) -> Vector3 {
        math::transform_direction(&self.camera_to_world(), Vector3::Y)
    }

    /// Point the camera at `target`, keeping the current roll.
    pub fn look_at(&mut self, target: Vector3) {
        let dir = (target - self.position).normalized();
        if dir == Vector3::ZERO {
            return;
        }
        self.orientation.x = dir.y.clamp(-1.0, 1.0).asin();
        self.orientation.y = (-dir.x).atan2(dir.z);
    }

    /// Turn by the given yaw and pitch deltas (radians).
    pub fn rotate(&mut self, delta_yaw: f64, delta_pitch: f64) {
        self.orientation.y += delta_yaw;
        self.orientation.x += delta_pitch;

        // Keep pitch short of straight up/down so yaw stays meaningful.
        const MAX_PITCH: f64 = std::f64::consts::FRAC_PI_2 - 0.01;
        self.orientation.x = self.orientation.x.clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Move along the camera's forward/right axes and the world up axis.
    pub fn move_local(&mut self, forward: f64, right: f64, up: f64) {
        self.position += self.forward() * forward + self.right() * right + Vector3::Y * up;
    }
}
