/// Instrumentation for the rendering passes
/// Function/pixel counters are plain atomics so column-parallel and
/// stripe-parallel workers can bump them without coordination.
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe performance counters for function call tracking
pub struct FunctionCounters {
    // Landscape counters
    pub landscape_columns_traced: AtomicU64,
    pub landscape_ray_steps: AtomicU64,
    pub landscape_ground_pixels: AtomicU64,
    pub landscape_sky_pixels: AtomicU64,

    // Triangle pipeline counters
    pub triangles_submitted: AtomicU64,
    pub triangles_near_rejected: AtomicU64,
    pub triangles_offscreen_culled: AtomicU64,
    pub triangles_degenerate: AtomicU64,
    pub triangles_rasterized: AtomicU64,

    // Pixel counters
    pub set_pixel_attempts: AtomicU64,
    pub set_pixel_depth_passed: AtomicU64,
    pub set_pixel_depth_failed: AtomicU64,

    // Framebuffer counters
    pub framebuffer_clear_calls: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            landscape_columns_traced: AtomicU64::new(0),
            landscape_ray_steps: AtomicU64::new(0),
            landscape_ground_pixels: AtomicU64::new(0),
            landscape_sky_pixels: AtomicU64::new(0),
            triangles_submitted: AtomicU64::new(0),
            triangles_near_rejected: AtomicU64::new(0),
            triangles_offscreen_culled: AtomicU64::new(0),
            triangles_degenerate: AtomicU64::new(0),
            triangles_rasterized: AtomicU64::new(0),
            set_pixel_attempts: AtomicU64::new(0),
            set_pixel_depth_passed: AtomicU64::new(0),
            set_pixel_depth_failed: AtomicU64::new(0),
            framebuffer_clear_calls: AtomicU64::new(0),
        }
    }

    fn all(&self) -> [&AtomicU64; 13] {
        [
            &self.landscape_columns_traced,
            &self.landscape_ray_steps,
            &self.landscape_ground_pixels,
            &self.landscape_sky_pixels,
            &self.triangles_submitted,
            &self.triangles_near_rejected,
            &self.triangles_offscreen_culled,
            &self.triangles_degenerate,
            &self.triangles_rasterized,
            &self.set_pixel_attempts,
            &self.set_pixel_depth_passed,
            &self.set_pixel_depth_failed,
            &self.framebuffer_clear_calls,
        ]
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in self.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> CounterSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CounterSnapshot {
            landscape_columns_traced: load(&self.landscape_columns_traced),
            landscape_ray_steps: load(&self.landscape_ray_steps),
            landscape_ground_pixels: load(&self.landscape_ground_pixels),
            landscape_sky_pixels: load(&self.landscape_sky_pixels),
            triangles_submitted: load(&self.triangles_submitted),
            triangles_near_rejected: load(&self.triangles_near_rejected),
            triangles_offscreen_culled: load(&self.triangles_offscreen_culled),
            triangles_degenerate: load(&self.triangles_degenerate),
            triangles_rasterized: load(&self.triangles_rasterized),
            set_pixel_attempts: load(&self.set_pixel_attempts),
            set_pixel_depth_passed: load(&self.set_pixel_depth_passed),
            set_pixel_depth_failed: load(&self.set_pixel_depth_failed),
            framebuffer_clear_calls: load(&self.framebuffer_clear_calls),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub landscape_columns_traced: u64,
    pub landscape_ray_steps: u64,
    pub landscape_ground_pixels: u64,
    pub landscape_sky_pixels: u64,
    pub triangles_submitted: u64,
    pub triangles_near_rejected: u64,
    pub triangles_offscreen_culled: u64,
    pub triangles_degenerate: u64,
    pub triangles_rasterized: u64,
    pub set_pixel_attempts: u64,
    pub set_pixel_depth_passed: u64,
    pub set_pixel_depth_failed: u64,
    pub framebuffer_clear_calls: u64,
}

impl CounterSnapshot {
    /// Fraction of depth tests that passed, if any were attempted.
    pub fn depth_pass_rate(&self) -> Option<f64> {
        (self.set_pixel_attempts > 0)
            .then(|| self.set_pixel_depth_passed as f64 / self.set_pixel_attempts as f64)
    }

    /// Log the counters at info level.
    pub fn log_report(&self) {
        tracing::info!(
            columns = self.landscape_columns_traced,
            ray_steps = self.landscape_ray_steps,
            ground_pixels = self.landscape_ground_pixels,
            sky_pixels = self.landscape_sky_pixels,
            "landscape counters"
        );
        tracing::info!(
            submitted = self.triangles_submitted,
            near_rejected = self.triangles_near_rejected,
            offscreen_culled = self.triangles_offscreen_culled,
            degenerate = self.triangles_degenerate,
            rasterized = self.triangles_rasterized,
            "triangle counters"
        );
        tracing::info!(
            attempts = self.set_pixel_attempts,
            passed = self.set_pixel_depth_passed,
            failed = self.set_pixel_depth_failed,
            pass_rate = self.depth_pass_rate().unwrap_or(0.0),
            clears = self.framebuffer_clear_calls,
            "pixel counters"
        );
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Macro for incrementing a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Macro for adding to a counter (only when profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
