/// Triangle data flowing through the triangle pass
/// `Triangle` is the caller's world-space input; `ScreenTriangle` is the
/// transformed copy the rasterizers consume. Textures are borrowed, never owned.
use crate::image::{Image, Rgba8};
use crate::math::{Vector2, Vector3};

/// Upper bound for clamped texture coordinates, just below 1.0.
const UV_MAX: f64 = 1.0 - f64::EPSILON;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vector3,
    pub uv: Vector2,
    /// Homogeneous coordinate; 1 for every input vertex.
    pub w: f64,
}

impl Vertex {
    pub fn new(position: Vector3, uv: Vector2) -> Self {
        Self { position, uv, w: 1.0 }
    }

    /// Vertex with texture coordinates clamped into `[0, 1)`, the range
    /// mesh loaders hand over.
    pub fn with_clamped_uv(position: Vector3, uv: Vector2) -> Self {
        Self::new(position, uv.clamp(Vector2::ZERO, Vector2::splat(UV_MAX)))
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Vector3::ZERO, Vector2::ZERO)
    }
}

/// Surface description shared by one or more triangles.
#[derive(Copy, Clone, Debug)]
pub struct Material<'a> {
    pub base_color: Rgba8,
    pub texture: Option<&'a Image<u8, 4>>,
}

impl<'a> Material<'a> {
    pub fn solid(base_color: Rgba8) -> Self {
        Self {
            base_color,
            texture: None,
        }
    }

    pub fn textured(texture: &'a Image<u8, 4>) -> Self {
        Self {
            base_color: Rgba8::rgba(255, 255, 255, 255),
            texture: Some(texture),
        }
    }

    /// Surface color at normalized texture coordinates.
    #[inline]
    pub fn shade(&self, u: f64, v: f64) -> Rgba8 {
        match self.texture {
            Some(texture) => {
                texture.bilinear_sample(u * texture.width() as f64, v * texture.height() as f64)
            }
            None => self.base_color,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Triangle<'a> {
    pub vertices: [Vertex; 3],
    pub material: Material<'a>,
}

impl<'a> Triangle<'a> {
    pub fn new(vertices: [Vertex; 3], material: Material<'a>) -> Self {
        Self { vertices, material }
    }

    /// Untextured triangle from three positions.
    pub fn solid(a: Vector3, b: Vector3, c: Vector3, color: Rgba8) -> Self {
        Self::new(
            [Vertex::new(a, Vector2::ZERO), Vertex::new(b, Vector2::ZERO), Vertex::new(c, Vector2::ZERO)],
            Material::solid(color),
        )
    }
}

/// A vertex after the full transform, in pixel coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScreenVertex {
    /// Pixel coordinates after the perspective divide.
    pub position: Vector2,
    /// Projected z before the divide; kept for diagnostics.
    pub clip_z: f64,
    /// World-space distance from the camera; the value rasterizers
    /// interpolate and depth-test.
    pub camera_distance: f64,
    /// Clip-space w (view-space depth), kept for perspective correction.
    pub w: f64,
    pub uv: Vector2,
}

#[derive(Copy, Clone, Debug)]
pub struct ScreenTriangle<'a> {
    pub vertices: [ScreenVertex; 3],
    pub material: Material<'a>,
}

impl<'a> ScreenTriangle<'a> {
    pub fn new(vertices: [ScreenVertex; 3], material: Material<'a>) -> Self {
        Self { vertices, material }
    }

    /// Twice the signed screen-space area; positive for one winding,
    /// negative for the other.
    #[inline]
    pub fn doubled_area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        (c.position.x - a.position.x) * (b.position.y - a.position.y)
            - (b.position.x - a.position.x) * (c.position.y - a.position.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_vertices_start_with_unit_w() {
        let v = Vertex::new(Vector3::ONE, Vector2::ZERO);
        assert_eq!(v.w, 1.0);
        assert_eq!(Vertex::default().w, 1.0);
    }

    #[test]
    fn clamped_uv_stays_below_one() {
        let v = Vertex::with_clamped_uv(Vector3::ZERO, Vector2::new(1.5, -0.2));
        assert!(v.uv.x < 1.0 && v.uv.x > 0.99);
        assert_eq!(v.uv.y, 0.0);
    }

    #[test]
    fn shading_samples_texture_when_present() {
        let texture = Image::from_fn(2, 2, |x, _| {
            if x == 0 {
                Rgba8::rgba(255, 0, 0, 255)
            } else {
                Rgba8::rgba(0, 0, 255, 255)
            }
        });
        let textured = Material::textured(&texture);
        assert_eq!(textured.shade(0.0, 0.0), Rgba8::rgba(255, 0, 0, 255));
        assert_eq!(textured.shade(0.5, 0.0), Rgba8::rgba(0, 0, 255, 255));

        let solid = Material::solid(Rgba8::rgba(1, 2, 3, 4));
        assert_eq!(solid.shade(0.7, 0.1), Rgba8::rgba(1, 2, 3, 4));
    }

    #[test]
    fn doubled_area_sign_follows_winding() {
        let vertex = |x: f64, y: f64| ScreenVertex {
            position: Vector2::new(x, y),
            ..ScreenVertex::default()
        };
        let tri = ScreenTriangle::new(
            [vertex(0.0, 0.0), vertex(4.0, 0.0), vertex(0.0, 4.0)],
            Material::solid(Rgba8::default()),
        );
        assert_eq!(tri.doubled_area(), -16.0);

        let flipped = ScreenTriangle::new(
            [tri.vertices[0], tri.vertices[2], tri.vertices[1]],
            tri.material,
        );
        assert_eq!(flipped.doubled_area(), 16.0);
    }
}
