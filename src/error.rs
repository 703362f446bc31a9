//! Error types for buffer construction and configuration

use thiserror::Error;

/// Result type for fallible renderer setup
pub type RenderResult<T> = Result<T, RenderError>;

/// Contract violations detected when buffers or configs are built.
///
/// Rendering itself never returns errors: the panicking constructors turn
/// these into fatal precondition failures before a frame can start.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("invalid resolution {width}x{height}: both dimensions must be non-zero")]
    InvalidResolution { width: usize, height: usize },

    #[error("{what} dimensions mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("pixel count mismatch: a {width}x{height} image needs {expected} pixels, got {found}")]
    PixelCountMismatch {
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },

    #[error("channel index {index} out of range for a {channels}-channel color")]
    InvalidChannel { index: usize, channels: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl RenderError {
    pub(crate) fn check_resolution(width: usize, height: usize) -> RenderResult<()> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidResolution { width, height });
        }
        Ok(())
    }
}
