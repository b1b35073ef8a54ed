//! Central error types for the recording engine (thiserror-based).

use thiserror::Error;

use crate::color::PixelFormat;
use crate::types::Resolution;

/// Frame geometry and allocation errors.
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Invalid frame dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Width {width} breaks 32-byte row alignment (must be a multiple of 8)")]
    MisalignedWidth { width: u32 },

    #[error("Frame allocation failed: {bytes} bytes")]
    AllocationFailed { bytes: usize },

    #[error("Resolution mismatch: expected {expected}, got {got}")]
    ResolutionMismatch {
        expected: Resolution,
        got: Resolution,
    },

    #[error("Pixel format mismatch: expected {expected:?}, got {got:?}")]
    FormatMismatch {
        expected: PixelFormat,
        got: PixelFormat,
    },
}

/// Encoding session errors.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Invalid encoder config: {0}")]
    InvalidConfig(String),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot {operation} while session is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },
}

/// Convenience Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;
