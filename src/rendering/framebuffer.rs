/// Framebuffer for software rendering
/// Stores color and depth information
///
/// Color and depth live in two separate images of identical size so each
/// renderer can touch only what it needs. Depth is camera distance in world
/// units: smaller is closer, and `SKY_DEPTH` marks "nothing was hit".
use crate::count_call;
use crate::error::{RenderError, RenderResult};
use crate::image::{Image, Rgba8, Scalar};
#[cfg(feature = "profiling")]
use crate::perf::FUNCTION_COUNTERS;

/// Depth of a pixel that no geometry covers.
pub const SKY_DEPTH: f64 = f64::MAX;

/// View into a contiguous set of rows in the framebuffer.
/// Used for multi-core rasterization where each worker owns a disjoint slice.
pub struct FrameSlice<'a> {
    pub width: usize,
    pub full_height: usize,
    pub y0: usize,
    pub height: usize,
    pub color: &'a mut [Rgba8],
    pub depth: &'a mut [Scalar],
}

/// Abstraction over a render target that supports depth-tested pixel writes.
/// Rasterizers draw through this so they can target a whole framebuffer or
/// one stripe of it.
pub trait PixelTarget {
    /// Full framebuffer width (stride for indexing).
    fn width(&self) -> usize;
    /// Full framebuffer height (used for screen-space clipping).
    fn full_height(&self) -> usize;
    /// Global rows this target may write.
    fn rows(&self) -> std::ops::Range<usize>;
    /// Depth-test (x, y) and on success store `depth` and return the color index.
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f64) -> Option<usize>;
    fn write_color(&mut self, index: usize, color: Rgba8);
}

impl<'a> FrameSlice<'a> {
    /// Perform a depth test at (x, y_global) and, if it passes, update depth and
    /// return the linear index into the local color buffer. Returns None if the
    /// pixel lies outside this slice or fails the depth test.
    #[inline]
    pub fn test_depth_and_get_index(&mut self, x: usize, y_global: usize, depth: f64) -> Option<usize> {
        if y_global < self.y0 || x >= self.width {
            return None;
        }
        let y_local = y_global - self.y0;
        if y_local >= self.height {
            return None;
        }

        count_call!(FUNCTION_COUNTERS.set_pixel_attempts);
        let index = y_local * self.width + x;
        if depth < self.depth[index].channels[0] {
            count_call!(FUNCTION_COUNTERS.set_pixel_depth_passed);
            self.depth[index].channels[0] = depth;
            Some(index)
        } else {
            count_call!(FUNCTION_COUNTERS.set_pixel_depth_failed);
            None
        }
    }

    #[inline]
    pub fn write_color(&mut self, index: usize, color: Rgba8) {
        self.color[index] = color;
    }

    /// Global row range covered by this slice.
    #[inline]
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.y0..self.y0 + self.height
    }
}

impl<'a> PixelTarget for FrameSlice<'a> {
    #[inline]
    fn width(&self) -> usize {
        self.width
    }

    #[inline]
    fn full_height(&self) -> usize {
        self.full_height
    }

    #[inline]
    fn rows(&self) -> std::ops::Range<usize> {
        FrameSlice::rows(self)
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f64) -> Option<usize> {
        FrameSlice::test_depth_and_get_index(self, x, y, depth)
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: Rgba8) {
        FrameSlice::write_color(self, index, color);
    }
}

#[derive(Clone, Debug)]
pub struct Framebuffer {
    color: Image<u8, 4>,
    depth: Image<f64, 1>,
}

impl Framebuffer {
    /// # Panics
    /// If either dimension is zero.
    pub fn new(width: usize, height: usize) -> Self {
        match Self::try_new(width, height) {
            Ok(framebuffer) => framebuffer,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_new(width: usize, height: usize) -> RenderResult<Self> {
        let color = Image::try_new(width, height)?;
        let mut depth = Image::try_new(width, height)?;
        depth.fill(Scalar::scalar(SKY_DEPTH));
        Ok(Self { color, depth })
    }

    /// Pair existing color and depth images; their sizes must match.
    pub fn from_images(color: Image<u8, 4>, depth: Image<f64, 1>) -> RenderResult<Self> {
        if !color.same_size_as(&depth) {
            return Err(RenderError::DimensionMismatch {
                what: "depth buffer",
                expected: (color.width(), color.height()),
                found: (depth.width(), depth.height()),
            });
        }
        Ok(Self { color, depth })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.color.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.color.height()
    }

    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.width() as f64 / self.height() as f64
    }

    /// Fill color with `clear_color` and reset every depth to `SKY_DEPTH`.
    pub fn clear(&mut self, clear_color: Rgba8) {
        count_call!(FUNCTION_COUNTERS.framebuffer_clear_calls);
        self.color.fill(clear_color);
        self.depth.fill(Scalar::scalar(SKY_DEPTH));
    }

    /// Set pixel with depth test; the write happens only if `depth` is
    /// strictly closer than the stored depth.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgba8, depth: f64) -> bool {
        if x >= self.width() || y >= self.height() {
            return false;
        }

        count_call!(FUNCTION_COUNTERS.set_pixel_attempts);
        let stored = self.depth.texel_mut(x, y);
        if depth < stored.channels[0] {
            count_call!(FUNCTION_COUNTERS.set_pixel_depth_passed);
            stored.channels[0] = depth;
            *self.color.texel_mut(x, y) = color;
            true
        } else {
            count_call!(FUNCTION_COUNTERS.set_pixel_depth_failed);
            false
        }
    }

    /// Set pixel and depth without testing (landscape pass).
    #[inline]
    pub fn write_pixel(&mut self, x: usize, y: usize, color: Rgba8, depth: f64) {
        *self.color.texel_mut(x, y) = color;
        self.depth.texel_mut(x, y).channels[0] = depth;
    }

    #[inline]
    pub fn color_at(&self, x: usize, y: usize) -> Rgba8 {
        *self.color.texel(x, y)
    }

    #[inline]
    pub fn depth_at(&self, x: usize, y: usize) -> f64 {
        self.depth.texel(x, y).channels[0]
    }

    pub fn color(&self) -> &Image<u8, 4> {
        &self.color
    }

    pub fn depth(&self) -> &Image<f64, 1> {
        &self.depth
    }

    /// Color buffer packed as ARGB32, ready to hand to a presentation surface.
    pub fn to_argb32(&self) -> Vec<u32> {
        self.color.pixels().iter().map(Rgba8::to_argb32).collect()
    }

    /// Create a FrameSlice covering the entire framebuffer
    pub fn as_full_slice_mut(&mut self) -> FrameSlice<'_> {
        let width = self.width();
        let height = self.height();
        FrameSlice {
            width,
            full_height: height,
            y0: 0,
            height,
            color: self.color.pixels_mut(),
            depth: self.depth.pixels_mut(),
        }
    }

    /// Split the framebuffer into horizontal stripes for multi-core rendering.
    /// Each stripe owns a disjoint subset of rows, so they can be rendered in parallel.
    pub fn split_into_stripes(&mut self, stripes: usize) -> Vec<FrameSlice<'_>> {
        let stripes = stripes.max(1);
        let width = self.width();
        let height = self.height();

        let mut slices = Vec::with_capacity(stripes);

        let mut remaining_color: &mut [Rgba8] = self.color.pixels_mut();
        let mut remaining_depth: &mut [Scalar] = self.depth.pixels_mut();

        let mut y0 = 0usize;
        let rows_per_stripe = height.div_ceil(stripes);

        for _ in 0..stripes {
            if y0 >= height {
                break;
            }
            let rows = (height - y0).min(rows_per_stripe);
            let pixels = rows * width;

            let (color_head, color_tail) = remaining_color.split_at_mut(pixels);
            let (depth_head, depth_tail) = remaining_depth.split_at_mut(pixels);

            slices.push(FrameSlice {
                width,
                full_height: height,
                y0,
                height: rows,
                color: color_head,
                depth: depth_head,
            });

            remaining_color = color_tail;
            remaining_depth = depth_tail;
            y0 += rows;
        }

        slices
    }
}
