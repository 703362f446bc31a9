/// Performance measurement utilities
/// Each rendering pass is timed and logged for optimization analysis
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

/// Logs the elapsed time of a scope at debug level when dropped.
pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        let elapsed = self.elapsed();
        tracing::debug!(scope = self.name, micros = elapsed.as_micros() as u64, "perf");
    }
}

/// Per-frame timing accumulator
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameStats {
    pub landscape_us: f64,
    pub transform_us: f64,
    pub rasterization_us: f64,
    pub total_us: f64,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn share(&self, part: f64) -> f64 {
        if self.total_us > 0.0 {
            part / self.total_us * 100.0
        } else {
            0.0
        }
    }

    /// Frames per second implied by `total_us`, if any time was recorded.
    pub fn fps(&self) -> Option<f64> {
        (self.total_us > 0.0).then(|| 1_000_000.0 / self.total_us)
    }

    /// Running average over `count` frames; `self` holds the sums.
    pub fn averaged(&self, count: usize) -> Self {
        if count == 0 {
            return *self;
        }
        let n = count as f64;
        Self {
            landscape_us: self.landscape_us / n,
            transform_us: self.transform_us / n,
            rasterization_us: self.rasterization_us / n,
            total_us: self.total_us / n,
        }
    }

    pub fn accumulate(&mut self, other: &FrameStats) {
        self.landscape_us += other.landscape_us;
        self.transform_us += other.transform_us;
        self.rasterization_us += other.rasterization_us;
        self.total_us += other.total_us;
    }

    pub fn log_summary(&self) {
        tracing::info!(
            landscape_us = format_args!("{:.2}", self.landscape_us),
            landscape_pct = format_args!("{:.1}", self.share(self.landscape_us)),
            transform_us = format_args!("{:.2}", self.transform_us),
            transform_pct = format_args!("{:.1}", self.share(self.transform_us)),
            raster_us = format_args!("{:.2}", self.rasterization_us),
            raster_pct = format_args!("{:.1}", self.share(self.rasterization_us)),
            total_us = format_args!("{:.2}", self.total_us),
            "frame summary"
        );
    }
}

/// Macro for easy performance measurement
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
