/// Fixed-channel-count colors
/// Channel storage is generic so the same type serves 8-bit RGBA pixels,
/// grayscale heights and floating-point depth values.
use std::ops::{Index, IndexMut, Mul};

/// A scalar type that can be stored in a color channel.
///
/// Conversions go through `f64` so sampling code can interpolate any channel
/// type with the same arithmetic.
pub trait Channel: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// Converts the channel value to `f64` without loss for the supported types.
    fn to_f64(self) -> f64;
    /// Converts back from `f64`, truncating toward zero and saturating for
    /// integer channels.
    fn from_f64(value: f64) -> Self;
}

impl Channel for u8 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as u8
    }
}

impl Channel for f32 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Channel for f64 {
    #[inline(always)]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline(always)]
    fn from_f64(value: f64) -> Self {
        value
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color<T: Channel, const N: usize> {
    pub channels: [T; N],
}

/// 8-bit RGBA, the format of the color buffer and of all textures.
pub type Rgba8 = Color<u8, 4>;
/// Single `f64` channel, used for heightmaps and the depth buffer.
pub type Scalar = Color<f64, 1>;

impl<T: Channel, const N: usize> Color<T, N> {
    #[inline]
    pub const fn new(channels: [T; N]) -> Self {
        Self { channels }
    }

    /// Color with every channel set to `value`.
    #[inline]
    pub fn splat(value: T) -> Self {
        Self {
            channels: [value; N],
        }
    }

    #[inline]
    pub const fn channel_count() -> usize {
        N
    }
}

impl<T: Channel, const N: usize> Default for Color<T, N> {
    fn default() -> Self {
        Self::splat(T::default())
    }
}

impl Color<u8, 4> {
    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new([r, g, b, a])
    }

    #[inline]
    pub fn alpha(&self) -> u8 {
        self.channels[3]
    }

    /// Packs into ARGB32 for presentation layers that want a `u32` surface.
    #[inline]
    pub fn to_argb32(&self) -> u32 {
        let [r, g, b, a] = self.channels;
        ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
    }
}

impl Color<f64, 1> {
    #[inline]
    pub const fn scalar(value: f64) -> Self {
        Self::new([value])
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.channels[0]
    }
}

impl<T: Channel, const N: usize> Index<usize> for Color<T, N> {
    type Output = T;

    #[inline(always)]
    fn index(&self, idx: usize) -> &T {
        debug_assert!(idx < N, "overflowing color channels ({idx} >= {N})");
        &self.channels[idx]
    }
}

impl<T: Channel, const N: usize> IndexMut<usize> for Color<T, N> {
    #[inline(always)]
    fn index_mut(&mut self, idx: usize) -> &mut T {
        debug_assert!(idx < N, "overflowing color channels ({idx} >= {N})");
        &mut self.channels[idx]
    }
}

/// Per-channel scalar multiply; integer channels truncate and saturate.
impl<T: Channel, const N: usize> Mul<f64> for Color<T, N> {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        let mut out = self;
        for c in out.channels.iter_mut() {
            *c = T::from_f64(c.to_f64() * rhs);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_multiply_saturates_u8_channels() {
        let c = Rgba8::rgba(100, 200, 10, 255) * 1.5;
        assert_eq!(c, Rgba8::rgba(150, 255, 15, 255));
    }

    #[test]
    fn scalar_multiply_truncates() {
        let c = Rgba8::rgba(3, 3, 3, 3) * 0.5;
        assert_eq!(c.channels, [1, 1, 1, 1]);
    }

    #[test]
    fn argb_packing_places_alpha_high() {
        assert_eq!(Rgba8::rgba(0x11, 0x22, 0x33, 0xFF).to_argb32(), 0xFF112233);
    }

    #[test]
    fn default_is_all_zero() {
        assert_eq!(Scalar::default().value(), 0.0);
        assert_eq!(Rgba8::default().channels, [0; 4]);
    }
}
