/// Tiled image made of equally sized, borrowed tiles
/// Lets a large landscape be assembled from separately loaded pieces
/// without copying them into one allocation.
use super::{Channel, Color, Image};
use crate::error::{RenderError, RenderResult};

pub struct ImageMosaic<'a, T: Channel, const N: usize> {
    tiles_x: usize,
    tiles_y: usize,
    tile_width: usize,
    tile_height: usize,
    tiles: Vec<Option<&'a Image<T, N>>>,
}

impl<'a, T: Channel, const N: usize> ImageMosaic<'a, T, N> {
    /// # Panics
    /// If any count or tile dimension is zero.
    pub fn new(tiles_x: usize, tiles_y: usize, tile_width: usize, tile_height: usize) -> Self {
        if let Err(err) = RenderError::check_resolution(tiles_x, tiles_y)
            .and_then(|_| RenderError::check_resolution(tile_width, tile_height))
        {
            panic!("{err}");
        }

        Self {
            tiles_x,
            tiles_y,
            tile_width,
            tile_height,
            tiles: vec![None; tiles_x * tiles_y],
        }
    }

    /// Place `image` at tile position (`tile_x`, `tile_y`).
    pub fn insert_at(&mut self, tile_x: usize, tile_y: usize, image: &'a Image<T, N>) -> RenderResult<()> {
        if image.width() != self.tile_width || image.height() != self.tile_height {
            return Err(RenderError::DimensionMismatch {
                what: "mosaic tile",
                expected: (self.tile_width, self.tile_height),
                found: (image.width(), image.height()),
            });
        }
        if tile_x >= self.tiles_x || tile_y >= self.tiles_y {
            return Err(RenderError::DimensionMismatch {
                what: "mosaic tile position",
                expected: (self.tiles_x, self.tiles_y),
                found: (tile_x, tile_y),
            });
        }

        self.tiles[tile_x + tile_y * self.tiles_x] = Some(image);
        Ok(())
    }

    /// Full mosaic size in pixels.
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.tiles_x * self.tile_width, self.tiles_y * self.tile_height)
    }

    #[inline]
    fn tile_for(&self, x: f64, y: f64) -> Option<(&'a Image<T, N>, f64, f64)> {
        if self.out_of_range(x, y) {
            return None;
        }
        let tile_x = x as usize / self.tile_width;
        let tile_y = y as usize / self.tile_height;
        let tile = self.tiles[tile_x + tile_y * self.tiles_x]?;
        Some((
            tile,
            x - (tile_x * self.tile_width) as f64,
            y - (tile_y * self.tile_height) as f64,
        ))
    }

    /// True if a tile has been inserted under the given coordinates.
    pub fn has_data(&self, x: f64, y: f64) -> bool {
        self.tile_for(x, y).is_some()
    }

    pub fn out_of_range(&self, x: f64, y: f64) -> bool {
        let (width, height) = self.dimensions();
        x < 0.0 || y < 0.0 || x >= width as f64 || y >= height as f64
    }

    pub fn clamped_coordinates(&self, x: f64, y: f64) -> (f64, f64) {
        let (width, height) = self.dimensions();
        let clamp = |v: f64, max: usize| {
            if v < 0.0 {
                0.0
            } else if v >= max as f64 {
                (max - 1) as f64
            } else {
                v
            }
        };
        (clamp(x, width), clamp(y, height))
    }

    pub fn pixel_at(&self, x: f64, y: f64) -> Option<Color<T, N>> {
        self.tile_for(x, y).map(|(tile, lx, ly)| tile.pixel_at(lx, ly))
    }

    /// Bilinear read within the tile that contains (`x`, `y`). Filtering does
    /// not cross tile seams.
    pub fn bilinear_sample(&self, x: f64, y: f64) -> Option<Color<T, N>> {
        self.tile_for(x, y)
            .map(|(tile, lx, ly)| tile.bilinear_sample(lx, ly))
    }
}
