/// Dense 2D pixel grids with bounds-policy addressing and filtered sampling
///
/// Images own their pixels exclusively. Anything that needs to read an image
/// it does not own (materials, mosaics, samplers) holds a plain borrow.
pub mod color;
pub mod mosaic;

pub use color::{Channel, Color, Rgba8, Scalar};
pub use mosaic::ImageMosaic;

use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};

/// How sampling coordinates outside the image are mapped back into it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsPolicy {
    /// Coordinates are clamped to the edge pixels.
    #[default]
    Clamped,
    /// Coordinates repeat with a period of `dimension - 1`, then are clamped.
    Wrapped,
    /// Coordinates are used as given; callers guarantee they are in range.
    None,
}

#[derive(Clone, Debug)]
pub struct Image<T: Channel, const N: usize> {
    width: usize,
    height: usize,
    bpp: u32,
    pixels: Vec<Color<T, N>>,
    bounds: BoundsPolicy,
}

impl<T: Channel, const N: usize> Image<T, N> {
    /// Create a zero-filled image.
    ///
    /// # Panics
    /// If either dimension is zero.
    pub fn new(width: usize, height: usize) -> Self {
        match Self::try_new(width, height) {
            Ok(image) => image,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(width: usize, height: usize) -> RenderResult<Self> {
        RenderError::check_resolution(width, height)?;
        Ok(Self {
            width,
            height,
            bpp: Self::native_bpp(),
            pixels: vec![Color::default(); width * height],
            bounds: BoundsPolicy::default(),
        })
    }

    /// Wrap an existing row-major pixel vector.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color<T, N>>) -> RenderResult<Self> {
        RenderError::check_resolution(width, height)?;
        let expected = width * height;
        if pixels.len() != expected {
            return Err(RenderError::PixelCountMismatch {
                width,
                height,
                expected,
                found: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bpp: Self::native_bpp(),
            pixels,
            bounds: BoundsPolicy::default(),
        })
    }

    /// Build an image by evaluating `f(x, y)` for every pixel.
    ///
    /// # Panics
    /// If either dimension is zero.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Color<T, N>) -> Self {
        let mut image = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                image.pixels[x + y * width] = f(x, y);
            }
        }
        image
    }

    /// Builder-style bounds policy selection.
    pub fn with_bounds(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    /// Record the bit depth of the source this image was decoded from.
    pub fn with_bpp(mut self, bpp: u32) -> Self {
        self.bpp = bpp;
        self
    }

    fn native_bpp() -> u32 {
        (N * std::mem::size_of::<T>() * 8) as u32
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    #[inline]
    pub fn bounds_policy(&self) -> BoundsPolicy {
        self.bounds
    }

    pub fn set_bounds_policy(&mut self, bounds: BoundsPolicy) {
        self.bounds = bounds;
    }

    #[inline]
    pub fn same_size_as<U: Channel, const M: usize>(&self, other: &Image<U, M>) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn pixels(&self) -> &[Color<T, N>] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [Color<T, N>] {
        &mut self.pixels
    }

    /// Direct integer access. The range check only runs in debug builds;
    /// release builds still cannot read outside the pixel vector.
    #[inline(always)]
    pub fn texel(&self, x: usize, y: usize) -> &Color<T, N> {
        debug_assert!(
            x < self.width && y < self.height,
            "tried to access image pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        &self.pixels[x + y * self.width]
    }

    #[inline(always)]
    pub fn texel_mut(&mut self, x: usize, y: usize) -> &mut Color<T, N> {
        debug_assert!(
            x < self.width && y < self.height,
            "tried to access image pixel ({x}, {y}) out of bounds ({}x{})",
            self.width,
            self.height
        );
        &mut self.pixels[x + y * self.width]
    }

    /// Nearest-pixel read at fractional coordinates, after the bounds policy.
    #[inline]
    pub fn pixel_at(&self, x: f64, y: f64) -> Color<T, N> {
        let (x, y) = self.bounds_checked_coordinates(x, y);
        *self.texel(x as usize, y as usize)
    }

    /// Bilinearly filtered read at fractional coordinates, after the bounds
    /// policy. Integer coordinates away from the right/bottom edge return the
    /// stored pixel exactly.
    pub fn bilinear_sample(&self, x: f64, y: f64) -> Color<T, N> {
        let (x, y) = self.bounds_checked_coordinates(x, y);

        // Keep the +1 neighbour inside the image.
        let x0 = (x.floor() as usize).min(self.width.saturating_sub(2));
        let y0 = (y.floor() as usize).min(self.height.saturating_sub(2));
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let x_bias = x - x0 as f64;
        let y_bias = y - y0 as f64;

        let top_left = self.texel(x0, y0);
        let bottom_left = self.texel(x0, y1);
        let top_right = self.texel(x1, y0);
        let bottom_right = self.texel(x1, y1);

        let mut out = Color::default();
        for i in 0..N {
            let c1 = T::from_f64(crate::math::lerp(top_left[i].to_f64(), bottom_left[i].to_f64(), y_bias));
            let c2 = T::from_f64(crate::math::lerp(top_right[i].to_f64(), bottom_right[i].to_f64(), y_bias));
            out[i] = T::from_f64(crate::math::lerp(c1.to_f64(), c2.to_f64(), x_bias));
        }
        out
    }

    /// Maps coordinates into the image according to its bounds policy.
    #[inline]
    pub fn bounds_checked_coordinates(&self, x: f64, y: f64) -> (f64, f64) {
        match self.bounds {
            BoundsPolicy::Clamped => self.clamped_coordinates(x, y),
            BoundsPolicy::Wrapped => self.wrapped_coordinates(x, y),
            BoundsPolicy::None => {
                debug_assert!(
                    x >= 0.0 && y >= 0.0 && x < self.width as f64 && y < self.height as f64,
                    "unchecked image coordinates ({x}, {y}) out of bounds ({}x{})",
                    self.width,
                    self.height
                );
                (x, y)
            }
        }
    }

    #[inline]
    pub fn clamped_coordinates(&self, x: f64, y: f64) -> (f64, f64) {
        (
            clamp_coordinate(x, self.width),
            clamp_coordinate(y, self.height),
        )
    }

    /// Repeats coordinates with a period of `dimension - 1`, rescaled to the
    /// full dimension, then clamps. x = width - 1 always wraps to 0; x = width
    /// lands on column 0 only when width is 2 (column 1 for a 4-pixel-wide image).
    #[inline]
    pub fn wrapped_coordinates(&self, x: f64, y: f64) -> (f64, f64) {
        (
            clamp_coordinate(wrap_coordinate(x, self.width), self.width),
            clamp_coordinate(wrap_coordinate(y, self.height), self.height),
        )
    }

    pub fn fill(&mut self, color: Color<T, N>) {
        self.pixels.fill(color);
    }

    /// Set one channel of every pixel.
    ///
    /// # Panics
    /// If `channel >= N`.
    pub fn fill_channel(&mut self, value: T, channel: usize) {
        assert!(
            channel < N,
            "{}",
            RenderError::InvalidChannel {
                index: channel,
                channels: N
            }
        );
        for pixel in self.pixels.iter_mut() {
            pixel.channels[channel] = value;
        }
    }

    /// Copy of the image converted to another channel type and count.
    ///
    /// Target channel `i` reads source channel `i % N`, multiplied by `scale`
    /// and clamped into `[low, high]`.
    pub fn convert<U: Channel, const M: usize>(&self, scale: f64, low: f64, high: f64) -> Image<U, M> {
        let pixels = self
            .pixels
            .iter()
            .map(|src| {
                let mut dst = Color::<U, M>::default();
                for i in 0..M {
                    let value = src.channels[i % N].to_f64() * scale;
                    dst.channels[i] = U::from_f64(value.min(high).max(low));
                }
                dst
            })
            .collect();

        Image {
            width: self.width,
            height: self.height,
            bpp: self.bpp,
            pixels,
            bounds: self.bounds,
        }
    }
}

#[inline(always)]
fn clamp_coordinate(value: f64, dimension: usize) -> f64 {
    if value < 0.0 {
        0.0
    } else if value >= dimension as f64 {
        (dimension - 1) as f64
    } else {
        value
    }
}

#[inline(always)]
fn wrap_coordinate(value: f64, dimension: usize) -> f64 {
    if dimension <= 1 {
        return 0.0;
    }
    let period = (dimension - 1) as f64;
    let t = value / period;
    (t - t.floor()) * dimension as f64
}
