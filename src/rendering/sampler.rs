/// Sampler interfaces the landscape ray-marcher reads the world through
/// Heights and ground colors are addressed by ground coordinates (x, z);
/// the sky is addressed by view direction.
use crate::image::{Image, ImageMosaic, Rgba8};
use crate::math::Vector3;
use serde::{Deserialize, Serialize};

/// Filtering requested by the caller for one sample.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SampleFilter {
    #[default]
    Bilinear,
    Nearest,
}

/// Height field lookup: ground (x, z) to surface height.
pub trait HeightSampler: Sync {
    fn height_at(&self, x: f64, z: f64, filter: SampleFilter) -> f64;

    /// Grid size backing this sampler, if it has one.
    fn dimensions(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Ground color lookup. Alpha 0 means "no ground here".
pub trait GroundSampler: Sync {
    fn ground_color(&self, x: f64, z: f64, filter: SampleFilter) -> Rgba8;

    fn dimensions(&self) -> Option<(usize, usize)> {
        None
    }
}

/// Sky color for a unit view direction.
pub trait SkySampler: Sync {
    fn sky_color(&self, direction: Vector3) -> Rgba8;
}

impl HeightSampler for Image<f64, 1> {
    #[inline]
    fn height_at(&self, x: f64, z: f64, filter: SampleFilter) -> f64 {
        match filter {
            SampleFilter::Bilinear => self.bilinear_sample(x, z).value(),
            SampleFilter::Nearest => self.pixel_at(x, z).value(),
        }
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some((self.width(), self.height()))
    }
}

/// Grayscale heightmaps decoded as RGBA use the red channel.
impl HeightSampler for Image<u8, 4> {
    #[inline]
    fn height_at(&self, x: f64, z: f64, filter: SampleFilter) -> f64 {
        let texel = match filter {
            SampleFilter::Bilinear => self.bilinear_sample(x, z),
            SampleFilter::Nearest => self.pixel_at(x, z),
        };
        texel.channels[0] as f64
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some((self.width(), self.height()))
    }
}

impl GroundSampler for Image<u8, 4> {
    #[inline]
    fn ground_color(&self, x: f64, z: f64, filter: SampleFilter) -> Rgba8 {
        match filter {
            SampleFilter::Bilinear => self.bilinear_sample(x, z),
            SampleFilter::Nearest => self.pixel_at(x, z),
        }
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some((self.width(), self.height()))
    }
}

/// Missing tiles read as height 0.
impl<'a> HeightSampler for ImageMosaic<'a, f64, 1> {
    fn height_at(&self, x: f64, z: f64, filter: SampleFilter) -> f64 {
        let sample = match filter {
            SampleFilter::Bilinear => self.bilinear_sample(x, z),
            SampleFilter::Nearest => self.pixel_at(x, z),
        };
        sample.map_or(0.0, |c| c.value())
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some(ImageMosaic::dimensions(self))
    }
}

/// Missing tiles read as transparent, so rays pass through them.
impl<'a> GroundSampler for ImageMosaic<'a, u8, 4> {
    fn ground_color(&self, x: f64, z: f64, filter: SampleFilter) -> Rgba8 {
        let sample = match filter {
            SampleFilter::Bilinear => self.bilinear_sample(x, z),
            SampleFilter::Nearest => self.pixel_at(x, z),
        };
        sample.unwrap_or_default()
    }

    fn dimensions(&self) -> Option<(usize, usize)> {
        Some(ImageMosaic::dimensions(self))
    }
}

/// Horizon color that darkens as the view direction steepens.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GradientSky {
    pub horizon: Rgba8,
    /// Largest amount subtracted from each RGB channel.
    pub max_attenuation: u8,
}

impl Default for GradientSky {
    fn default() -> Self {
        Self {
            horizon: Rgba8::rgba(125, 145, 175, 255),
            max_attenuation: 115,
        }
    }
}

impl SkySampler for GradientSky {
    #[inline]
    fn sky_color(&self, direction: Vector3) -> Rgba8 {
        let attenuation = (190.0 * direction.y.abs() * 1.1).floor().min(self.max_attenuation as f64) as u8;
        let [r, g, b, _] = self.horizon.channels;
        Rgba8::rgba(
            r.saturating_sub(attenuation),
            g.saturating_sub(attenuation),
            b.saturating_sub(attenuation),
            255,
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlatColorSky(pub Rgba8);

impl SkySampler for FlatColorSky {
    #[inline]
    fn sky_color(&self, _direction: Vector3) -> Rgba8 {
        self.0
    }
}
