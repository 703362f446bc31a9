/// Integration tests for the landscape ray-marcher.
/// Flat worlds make the expected hit distances easy to compute by hand.
use std::f64::consts::FRAC_PI_2;
use std::time::Instant;

use landscape_renderer::rendering::FlatColorSky;
use landscape_renderer::*;

const GROUND: Rgba8 = Rgba8::rgba(60, 160, 60, 255);
const SKY: Rgba8 = Rgba8::rgba(100, 150, 220, 255);

fn flat_heights(size: usize, height: f64) -> Image<f64, 1> {
    Image::from_fn(size, size, |_, _| Scalar::scalar(height))
}

fn flat_ground(size: usize, color: Rgba8) -> Image<u8, 4> {
    Image::from_fn(size, size, |_, _| color)
}

fn looking_down(position: Vector3) -> Camera {
    Camera::new(position, Vector3::new(-FRAC_PI_2, 0.0, 0.0), 90.0)
}

/// Screen-space offset of the centre of pixel `i` along an axis of `n` pixels,
/// for a 90 degree field of view.
fn pixel_offset(i: usize, n: usize) -> f64 {
    2.0 * ((i as f64 + 0.5) / n as f64) - 1.0
}

#[test]
fn looking_down_hits_flat_ground_at_the_expected_distance() {
    let heights = flat_heights(64, 0.0);
    let ground = flat_ground(64, GROUND);
    let sky = FlatColorSky(SKY);
    let landscape = Landscape::new(&heights, &ground).with_sky(&sky);

    let altitude = 50.0;
    let camera = looking_down(Vector3::new(32.0, altitude, 32.0));
    let renderer = LandscapeRenderer::new(LandscapeConfig {
        detail: DetailLevel::High,
        max_ray_steps: 100_000,
        ..LandscapeConfig::default()
    });
    let step = DetailLevel::High.step_size();

    let (width, height) = (4usize, 4usize);
    let mut fb = Framebuffer::new(width, height);

    let start = Instant::now();
    renderer.render(&camera, &landscape, &mut fb);
    println!("4x4 looking-down landscape: {:?}", start.elapsed());

    let corner = pixel_offset(0, width);
    let farthest = altitude * (1.0 + 2.0 * corner * corner).sqrt();

    for y in 0..height {
        for x in 0..width {
            assert_eq!(fb.color_at(x, y), GROUND, "pixel ({x}, {y}) should see ground");
            let depth = fb.depth_at(x, y);
            assert!(depth < SKY_DEPTH, "pixel ({x}, {y}) reported sky depth");
            assert!(
                depth >= altitude - step && depth <= farthest + 1.0,
                "pixel ({x}, {y}) depth {depth} outside [{altitude}, {farthest}]"
            );
        }
    }

    // The bottom row is traced first from the camera, so its hit distance is
    // exact to within one step.
    let sy = pixel_offset(0, height);
    for x in 0..width {
        let sx = pixel_offset(x, width);
        let expected = altitude * (1.0 + sx * sx + sy * sy).sqrt();
        let depth = fb.depth_at(x, height - 1);
        assert!(
            depth >= expected - 1e-9 && depth <= expected + step + 1e-9,
            "bottom row pixel {x}: depth {depth}, expected about {expected}"
        );
    }
}

#[test]
fn rays_that_run_out_of_steps_become_sky() {
    let heights = flat_heights(64, 0.0);
    let ground = flat_ground(64, GROUND);
    let sky = FlatColorSky(SKY);
    let landscape = Landscape::new(&heights, &ground).with_sky(&sky);

    // Ten steps of 0.2 never reach ground 50 units below.
    let renderer = LandscapeRenderer::new(LandscapeConfig {
        max_ray_steps: 10,
        ..LandscapeConfig::default()
    });
    let mut fb = Framebuffer::new(6, 4);
    renderer.render(&looking_down(Vector3::new(32.0, 50.0, 32.0)), &landscape, &mut fb);

    assert!(fb.color().pixels().iter().all(|c| *c == SKY));
    assert!(fb.depth().pixels().iter().all(|d| d.value() == SKY_DEPTH));
}

#[test]
fn landscape_overwrites_previous_frame_without_depth_test() {
    let heights = flat_heights(64, 0.0);
    let ground = flat_ground(64, GROUND);
    let landscape = Landscape::new(&heights, &ground);

    let mut fb = Framebuffer::new(5, 5);
    // Stale content that is nearer than anything the landscape produces.
    for y in 0..5 {
        for x in 0..5 {
            fb.write_pixel(x, y, Rgba8::rgba(255, 0, 255, 255), 0.001);
        }
    }

    LandscapeRenderer::default().render(&looking_down(Vector3::new(32.0, 10.0, 32.0)), &landscape, &mut fb);

    for y in 0..5 {
        for x in 0..5 {
            assert_eq!(fb.color_at(x, y), GROUND);
            assert!(fb.depth_at(x, y) >= 9.0);
        }
    }
}

#[test]
fn mosaic_landscape_matches_single_image() {
    let tile_heights = flat_heights(32, 0.0);
    let tile_ground = flat_ground(32, GROUND);
    let mut mosaic_heights = ImageMosaic::new(2, 2, 32, 32);
    let mut mosaic_ground = ImageMosaic::new(2, 2, 32, 32);
    for ty in 0..2 {
        for tx in 0..2 {
            mosaic_heights.insert_at(tx, ty, &tile_heights).unwrap();
            mosaic_ground.insert_at(tx, ty, &tile_ground).unwrap();
        }
    }

    let heights = flat_heights(64, 0.0);
    let ground = flat_ground(64, GROUND);
    let sky = FlatColorSky(SKY);

    // Low enough that every ray lands inside the 64x64 mosaic.
    let camera = looking_down(Vector3::new(32.0, 20.0, 32.0));
    let renderer = LandscapeRenderer::default();

    let mut from_image = Framebuffer::new(8, 8);
    renderer.render(&camera, &Landscape::new(&heights, &ground).with_sky(&sky), &mut from_image);

    let mut from_mosaic = Framebuffer::new(8, 8);
    let landscape = Landscape::try_new(&mosaic_heights, &mosaic_ground)
        .expect("mosaics of equal layout should pair")
        .with_sky(&sky);
    renderer.render(&camera, &landscape, &mut from_mosaic);

    assert_eq!(from_image.color().pixels(), from_mosaic.color().pixels());
    assert_eq!(from_image.depth().pixels(), from_mosaic.depth().pixels());
}

#[test]
fn missing_mosaic_tiles_are_see_through() {
    let tile_heights = flat_heights(32, 0.0);
    let tile_ground = flat_ground(32, GROUND);
    let mut heights = ImageMosaic::new(2, 2, 32, 32);
    let mut ground = ImageMosaic::new(2, 2, 32, 32);
    // Only the x >= 32 half of the world has data.
    for ty in 0..2 {
        heights.insert_at(1, ty, &tile_heights).unwrap();
        ground.insert_at(1, ty, &tile_ground).unwrap();
    }

    let sky = FlatColorSky(SKY);
    let landscape = Landscape::new(&heights, &ground).with_sky(&sky);
    let renderer = LandscapeRenderer::new(LandscapeConfig {
        max_ray_steps: 3_000,
        ..LandscapeConfig::default()
    });

    let mut fb = Framebuffer::new(4, 4);
    renderer.render(&looking_down(Vector3::new(32.0, 20.0, 32.0)), &landscape, &mut fb);

    // Columns either side of the seam see different halves of the world.
    let column_is_sky = |x: usize| (0..4).all(|y| fb.depth_at(x, y) == SKY_DEPTH && fb.color_at(x, y) == SKY);
    let column_is_ground = |x: usize| (0..4).all(|y| fb.depth_at(x, y) < SKY_DEPTH && fb.color_at(x, y) == GROUND);

    let left_sky = column_is_sky(0) && column_is_sky(1) && column_is_ground(2) && column_is_ground(3);
    let right_sky = column_is_ground(0) && column_is_ground(1) && column_is_sky(2) && column_is_sky(3);
    assert!(left_sky || right_sky, "expected one half of the view to see through the missing tiles");
}

#[test]
fn generated_terrain_renders_ground_below_and_sky_above() {
    let terrain = TerrainConfig {
        size: 128,
        ..TerrainConfig::default()
    };
    let heights = generate_heightmap(&terrain);
    let ground = generate_ground_texture(&heights, &terrain);
    let landscape = Landscape::try_new(&heights, &ground).unwrap();

    // Above every peak, looking slightly down.
    let camera = Camera::new(
        Vector3::new(64.0, terrain.max_height + 10.0, 0.0),
        Vector3::new(-0.3, 0.0, 0.0),
        60.0,
    );
    let renderer = LandscapeRenderer::new(LandscapeConfig {
        detail: DetailLevel::Low,
        max_ray_steps: 50_000,
        ..LandscapeConfig::default()
    });

    let mut fb = Framebuffer::new(32, 24);
    let start = Instant::now();
    renderer.render(&camera, &landscape, &mut fb);
    println!("32x24 generated terrain: {:?}", start.elapsed());

    for x in 0..32 {
        assert_eq!(fb.depth_at(x, 0), SKY_DEPTH, "top row at column {x} should be sky");
        assert!(fb.depth_at(x, 23) < SKY_DEPTH, "bottom row at column {x} should hit terrain");
    }
}
