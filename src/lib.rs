pub mod camera;
pub mod config;
pub mod error;
pub mod image;
pub mod math;
pub mod perf;
/// Landscape Renderer - software height-field ray-marcher and triangle rasterizer
/// Built with compartmentalized benchmarkable components
pub mod rendering;
pub mod terrain;

pub use camera::Camera;
pub use config::{DetailLevel, LandscapeConfig, RasterizerKind, RenderConfig, TriangleConfig};
pub use error::{RenderError, RenderResult};
pub use image::{BoundsPolicy, Color, Image, ImageMosaic, Rgba8, Scalar};
pub use math::{Matrix4, Vector2, Vector3, VectorExt};
pub use perf::{CounterSnapshot, FrameStats, FunctionCounters, FUNCTION_COUNTERS};
pub use rendering::{
    render_scene, Framebuffer, Landscape, LandscapeRenderer, Material, Rasterizer, Scene, SceneRenderer,
    Triangle, TriangleRenderer, Vertex, SKY_DEPTH,
};
pub use terrain::{generate_ground_texture, generate_heightmap, TerrainConfig};
