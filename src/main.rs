/// Headless demo
/// Generates a terrain, places a small mesh on it and flies the camera over
/// it for a few frames, logging per-frame timings.
///
/// Usage: landscape_renderer [config.json] [frames]
use anyhow::{Context, Result};
use landscape_renderer::*;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const WIDTH: usize = 640;
const HEIGHT: usize = 360;
const DEFAULT_FRAMES: usize = 30;

fn load_config(path: Option<&str>) -> Result<RenderConfig> {
    let Some(path) = path else {
        return Ok(RenderConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading config {path}"))?;
    RenderConfig::from_json(&text).with_context(|| format!("parsing config {path}"))
}

/// A textured pyramid standing on the terrain.
fn build_pyramid<'a>(center: Vector3, size: f64, texture: &'a Image<u8, 4>) -> Vec<Triangle<'a>> {
    let apex = center + Vector3::new(0.0, size, 0.0);
    let corners = [
        center + Vector3::new(-size, 0.0, -size),
        center + Vector3::new(size, 0.0, -size),
        center + Vector3::new(size, 0.0, size),
        center + Vector3::new(-size, 0.0, size),
    ];

    let material = Material::textured(texture);
    (0..4)
        .map(|i| {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            Triangle::new(
                [
                    Vertex::with_clamped_uv(a, Vector2::new(0.0, 1.0)),
                    Vertex::with_clamped_uv(b, Vector2::new(1.0, 1.0)),
                    Vertex::with_clamped_uv(apex, Vector2::new(0.5, 0.0)),
                ],
                material,
            )
        })
        .collect()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = load_config(args.get(1).map(String::as_str))?;
    let frames = match args.get(2) {
        Some(n) => n.parse::<usize>().with_context(|| format!("invalid frame count {n}"))?,
        None => DEFAULT_FRAMES,
    };

    tracing::info!(
        width = WIDTH,
        height = HEIGHT,
        detail = ?config.landscape.detail,
        rasterizer = ?config.triangles.rasterizer,
        frames,
        "starting headless render"
    );

    let terrain = TerrainConfig::default();
    let (heights, ground) = {
        perf_scope!("terrain generation");
        let heights = generate_heightmap(&terrain);
        let ground = generate_ground_texture(&heights, &terrain);
        (heights, ground)
    };
    tracing::info!(size = terrain.size, seed = terrain.seed, "terrain generated");

    let brick = Image::from_fn(16, 16, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba8::rgba(170, 60, 40, 255)
        } else {
            Rgba8::rgba(220, 200, 170, 255)
        }
    });
    let center = terrain.size as f64 / 2.0;
    let base_height = heights.texel(terrain.size / 2, terrain.size / 2).value();
    let pyramid = build_pyramid(Vector3::new(center, base_height, center), 12.0, &brick);

    let landscape = Landscape::try_new(&heights, &ground)?;
    let renderer = SceneRenderer::new(&config);
    let mut framebuffer = Framebuffer::try_new(WIDTH, HEIGHT)?;

    let mut camera = Camera::new(
        Vector3::new(center, base_height + 40.0, center - 120.0),
        Vector3::ZERO,
        60.0,
    );
    camera.look_at(Vector3::new(center, base_height, center));

    let mut totals = FrameStats::new();
    for frame in 0..frames {
        let scene = Scene::new(camera).with_landscape(landscape).with_triangles(&pyramid);
        let stats = renderer.render(&scene, &mut framebuffer);
        tracing::debug!(frame, total_us = stats.total_us, "frame done");
        totals.accumulate(&stats);

        // Strafe around the pyramid while keeping it in view.
        camera.move_local(0.0, 2.0, 0.0);
        camera.look_at(Vector3::new(center, base_height, center));
    }

    let average = totals.averaged(frames);
    average.log_summary();
    if let Some(fps) = average.fps() {
        tracing::info!(fps = format_args!("{fps:.1}"), "average frame rate");
    }

    #[cfg(feature = "profiling")]
    FUNCTION_COUNTERS.snapshot().log_report();

    let sky_pixels = framebuffer.depth().pixels().iter().filter(|d| d.value() == SKY_DEPTH).count();
    tracing::info!(
        sky_pixels,
        covered_pixels = WIDTH * HEIGHT - sky_pixels,
        "last frame coverage"
    );

    Ok(())
}
