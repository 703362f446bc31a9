/// Vector and 4x4 matrix algebra shared by both renderers
/// All matrices are column-major: element (row, col) lives at `row + col * 4`,
/// which is the layout `DMat4::from_cols_array` expects.
use glam::{DMat4, DVec2, DVec3, DVec4};

pub type Vector2 = DVec2;
pub type Vector3 = DVec3;
pub type Matrix4 = DMat4;

/// Extra vector operations with the semantics the renderers rely on.
pub trait VectorExt {
    /// Unit-length copy of the vector. Zero vectors and vectors that are
    /// already exactly unit length are returned unchanged.
    fn normalized(self) -> Self;

    /// Euclidean distance between two points.
    fn distance_to(self, other: Self) -> f64;
}

impl VectorExt for DVec3 {
    #[inline]
    fn normalized(self) -> Self {
        let squared_norm = self.length_squared();
        if squared_norm == 0.0 || squared_norm == 1.0 {
            return self;
        }
        self * (1.0 / squared_norm.sqrt())
    }

    #[inline]
    fn distance_to(self, other: Self) -> f64 {
        (other - self).length()
    }
}

#[inline]
pub fn identity() -> Matrix4 {
    DMat4::IDENTITY
}

/// Rotation about X, then Y, then Z, composed as `Rx * Ry * Rz`.
///
/// The Y rotation is left-handed (`m[0][2] = -sin`), matching the
/// +Z-forward camera space used throughout the crate.
pub fn rotation(x: f64, y: f64, z: f64) -> Matrix4 {
    let (sx, cx) = x.sin_cos();
    let (sy, cy) = y.sin_cos();
    let (sz, cz) = z.sin_cos();

    #[rustfmt::skip]
    let rx = DMat4::from_cols_array(&[
        1.0, 0.0, 0.0, 0.0,
        0.0, cx,  sx,  0.0,
        0.0, -sx, cx,  0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[rustfmt::skip]
    let ry = DMat4::from_cols_array(&[
        cy,  0.0, sy,  0.0,
        0.0, 1.0, 0.0, 0.0,
        -sy, 0.0, cy,  0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);

    #[rustfmt::skip]
    let rz = DMat4::from_cols_array(&[
        cz,  sz,  0.0, 0.0,
        -sz, cz,  0.0, 0.0,
        0.0, 0.0, 1.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ]);

    rx * ry * rz
}

#[inline]
pub fn translation(x: f64, y: f64, z: f64) -> Matrix4 {
    DMat4::from_translation(DVec3::new(x, y, z))
}

#[inline]
pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4 {
    DMat4::from_scale(DVec3::new(x, y, z))
}

/// Perspective projection whose output `w` equals the input's view-space `z`.
///
/// # Panics
/// If `z_near == z_far` or `fov` is outside `(0, pi)`.
pub fn perspective(fov: f64, aspect_ratio: f64, z_near: f64, z_far: f64) -> Matrix4 {
    assert!(
        z_near != z_far,
        "perspective projection needs distinct near and far planes"
    );
    assert!(
        fov > 0.0 && fov < std::f64::consts::PI,
        "perspective field of view must lie in (0, pi), got {fov}"
    );

    let tan_half_fov = (fov / 2.0).tan();
    let z_range = z_near - z_far;

    #[rustfmt::skip]
    let m = DMat4::from_cols_array(&[
        1.0 / (tan_half_fov * aspect_ratio), 0.0,                0.0,                          0.0,
        0.0,                                 1.0 / tan_half_fov, 0.0,                          0.0,
        0.0,                                 0.0,                (-z_near - z_far) / z_range,  1.0,
        0.0,                                 0.0,                2.0 * z_far * z_near / z_range, 0.0,
    ]);
    m
}

/// Maps normalized device coordinates onto pixel coordinates, flipping Y and
/// placing pixel centers on integer coordinates.
pub fn screen_space(half_width: f64, half_height: f64) -> Matrix4 {
    #[rustfmt::skip]
    let m = DMat4::from_cols_array(&[
        half_width,       0.0,               0.0, 0.0,
        0.0,              -half_height,      0.0, 0.0,
        0.0,              0.0,               1.0, 0.0,
        half_width - 0.5, half_height - 0.5, 0.0, 1.0,
    ]);
    m
}

/// Full homogeneous transform of a point with an explicit `w`.
#[inline]
pub fn transform_point4(matrix: &Matrix4, position: DVec3, w: f64) -> DVec4 {
    *matrix * position.extend(w)
}

/// Applies only the upper 3x3 part of the matrix (no translation).
#[inline]
pub fn transform_direction(matrix: &Matrix4, direction: DVec3) -> DVec3 {
    matrix.transform_vector3(direction)
}

#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}
