/// Procedural terrain for demos, tests and benchmarks
/// Heights come from octaves of Perlin noise; ground colors are banded by
/// height and darkened on slopes.
use crate::image::{Image, Rgba8, Scalar};
use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Width and depth of the generated maps in pixels.
    pub size: usize,
    pub seed: u32,
    /// Height of the tallest possible peak.
    pub max_height: f64,
    /// Base noise frequency in cycles per pixel.
    pub frequency: f64,
    pub octaves: u32,
    /// Heights at or below this are painted as water.
    pub water_level: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            size: 512,
            seed: 12345,
            max_height: 120.0,
            frequency: 1.0 / 128.0,
            octaves: 5,
            water_level: 20.0,
        }
    }
}

/// Fractal sum of Perlin octaves mapped into `[0, 1]`.
fn fractal_noise(perlin: &Perlin, x: f64, z: f64, config: &TerrainConfig) -> f64 {
    let mut amplitude = 1.0;
    let mut frequency = config.frequency;
    let mut sum = 0.0;
    let mut norm = 0.0;

    for _ in 0..config.octaves.max(1) {
        sum += perlin.get([x * frequency, z * frequency]) * amplitude;
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    (sum / norm * 0.5 + 0.5).clamp(0.0, 1.0)
}

/// # Panics
/// If `config.size` is zero.
pub fn generate_heightmap(config: &TerrainConfig) -> Image<f64, 1> {
    let perlin = Perlin::new(config.seed);
    Image::from_fn(config.size, config.size, |x, z| {
        Scalar::scalar(fractal_noise(&perlin, x as f64, z as f64, config) * config.max_height)
    })
}

fn band_color(height: f64, config: &TerrainConfig) -> Rgba8 {
    let t = height / config.max_height;
    if height <= config.water_level {
        Rgba8::rgba(40, 80, 150, 255)
    } else if t < 0.22 {
        Rgba8::rgba(194, 178, 128, 255)
    } else if t < 0.55 {
        Rgba8::rgba(70, 130, 50, 255)
    } else if t < 0.8 {
        Rgba8::rgba(120, 110, 100, 255)
    } else {
        Rgba8::rgba(235, 235, 240, 255)
    }
}

/// Ground texture matching `heights`, one texel per height sample.
pub fn generate_ground_texture(heights: &Image<f64, 1>, config: &TerrainConfig) -> Image<u8, 4> {
    let (width, depth) = (heights.width(), heights.height());
    Image::from_fn(width, depth, |x, z| {
        let height = heights.texel(x, z).value();
        let east = heights.texel((x + 1).min(width - 1), z).value();
        let south = heights.texel(x, (z + 1).min(depth - 1)).value();

        // Steeper texels get darker.
        let slope = (east - height).abs() + (south - height).abs();
        let shade = (1.0 - slope * 0.15).clamp(0.55, 1.0);

        let mut color = band_color(height, config) * shade;
        color.channels[3] = 255;
        color
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> TerrainConfig {
        TerrainConfig {
            size: 32,
            ..TerrainConfig::default()
        }
    }

    #[test]
    fn heights_stay_within_range() {
        let config = small();
        let heights = generate_heightmap(&config);
        assert!(heights
            .pixels()
            .iter()
            .all(|h| (0.0..=config.max_height).contains(&h.value())));
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let a = generate_heightmap(&small());
        let b = generate_heightmap(&small());
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn ground_texture_matches_heightmap_and_is_opaque() {
        let config = small();
        let heights = generate_heightmap(&config);
        let ground = generate_ground_texture(&heights, &config);
        assert!(heights.same_size_as(&ground));
        assert!(ground.pixels().iter().all(|c| c.alpha() == 255));
    }
}
