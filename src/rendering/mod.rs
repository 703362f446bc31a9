pub mod barycentric;
pub mod framebuffer;
pub mod landscape;
/// Software rendering pipeline
/// A height-field ray-marcher and a triangle rasterizer sharing one framebuffer
pub mod rasterizer;
pub mod sampler;
pub mod scanline;
pub mod scene;
pub mod transform;
pub mod triangle;

pub use framebuffer::{FrameSlice, Framebuffer, PixelTarget, SKY_DEPTH};
pub use landscape::{Landscape, LandscapeRenderer};
pub use rasterizer::{Rasterizer, TrianglePassStats, TriangleRenderer};
pub use sampler::{FlatColorSky, GradientSky, GroundSampler, HeightSampler, SampleFilter, SkySampler};
pub use scene::{render_scene, Scene, SceneRenderer};
pub use transform::{transform_triangles, TransformOutcome, TransformPipeline, TransformedBatch};
pub use triangle::{Material, ScreenTriangle, ScreenVertex, Triangle, Vertex};
