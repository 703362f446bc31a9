/// Renderer configuration
/// Passed explicitly into each renderer call; nothing here is global state.
use crate::error::{RenderError, RenderResult};
use serde::{Deserialize, Serialize};

/// Landscape detail tier, trading ray-march accuracy for throughput.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailLevel {
    Lowest,
    Low,
    #[default]
    Mid,
    High,
    Highest,
}

impl DetailLevel {
    /// Length of one ray-march step in world units.
    pub const fn step_size(self) -> f64 {
        match self {
            DetailLevel::Lowest => 0.4,
            DetailLevel::Low => 0.3,
            DetailLevel::Mid => 0.2,
            DetailLevel::High => 0.1,
            DetailLevel::Highest => 0.05,
        }
    }

    /// Extra steps skipped per step already taken; grows the stride with distance.
    pub const fn skip_multiplier(self) -> f64 {
        match self {
            DetailLevel::Lowest => 0.0005,
            DetailLevel::Low => 0.0004,
            DetailLevel::Mid => 0.0003,
            DetailLevel::High => 0.0002,
            DetailLevel::Highest => 0.0001,
        }
    }
}

/// Which triangle fill algorithm the triangle pass uses.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterizerKind {
    /// Split the triangle at its middle vertex and walk edges row by row.
    Scanline,
    /// Walk the bounding box with incrementally stepped barycentric weights.
    #[default]
    Barycentric,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandscapeConfig {
    pub detail: DetailLevel,
    /// Steps after which a ray gives up and the pixel becomes sky.
    pub max_ray_steps: u32,
    /// Rays above this altitude that are still climbing can never hit terrain.
    pub height_ceiling: f64,
    /// Heights are sampled bilinearly for this many steps, nearest afterwards.
    pub bilinear_height_steps: u32,
    /// Ground colors are sampled bilinearly for this many steps, nearest afterwards.
    pub bilinear_color_steps: u32,
}

impl Default for LandscapeConfig {
    fn default() -> Self {
        Self {
            detail: DetailLevel::default(),
            max_ray_steps: 1_000_000,
            height_ceiling: 255.0,
            bilinear_height_steps: 500,
            bilinear_color_steps: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriangleConfig {
    pub rasterizer: RasterizerKind,
    pub z_near: f64,
    pub z_far: f64,
    /// World-space offset applied to every mesh vertex before viewing.
    pub mesh_offset: [f64; 3],
    /// Number of horizontal framebuffer stripes rasterized in parallel.
    /// 1 rasterizes on the calling thread.
    pub raster_stripes: usize,
}

impl Default for TriangleConfig {
    fn default() -> Self {
        Self {
            rasterizer: RasterizerKind::default(),
            z_near: 0.1,
            z_far: 1.0,
            mesh_offset: [0.0; 3],
            raster_stripes: 1,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub landscape: LandscapeConfig,
    pub triangles: TriangleConfig,
}

impl RenderConfig {
    pub fn with_detail(mut self, detail: DetailLevel) -> Self {
        self.landscape.detail = detail;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: RasterizerKind) -> Self {
        self.triangles.rasterizer = rasterizer;
        self
    }

    /// Check the invariants the renderers assume.
    pub fn validate(&self) -> RenderResult<()> {
        let t = &self.triangles;
        if t.z_near == t.z_far {
            return Err(RenderError::Config(format!(
                "near and far planes must differ (both {})",
                t.z_near
            )));
        }
        if t.raster_stripes == 0 {
            return Err(RenderError::Config("raster_stripes must be at least 1".into()));
        }
        if self.landscape.max_ray_steps == 0 {
            return Err(RenderError::Config("max_ray_steps must be at least 1".into()));
        }
        Ok(())
    }

    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(text: &str) -> RenderResult<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|err| RenderError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
