//! Pixel format types for captured frames.

use serde::{Deserialize, Serialize};

/// Packed pixel format in CPU memory.
///
/// Everything the recording path touches is 4 bytes per pixel; the variants
/// differ in channel order and whether the fourth byte carries alpha.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// B, G, R, one padding byte (desktop scanout order).
    Bgrx8,
    /// B, G, R, alpha.
    Bgra8,
    /// R, G, B, alpha.
    Rgba8,
}

/// The one format the capture-to-encode path uses end to end.
pub const STREAM_PIXEL_FORMAT: PixelFormat = PixelFormat::Bgrx8;

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Bgrx8 | Self::Bgra8 | Self::Rgba8 => 4,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Bgra8 | Self::Rgba8)
    }

    /// Short name for display/logging.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Bgrx8 => "BGRX8",
            Self::Bgra8 => "BGRA8",
            Self::Rgba8 => "RGBA8",
        }
    }
}
