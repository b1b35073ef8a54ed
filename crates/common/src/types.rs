//! Core geometry types for captured frames.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Video/image resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Self = Self {
        width: 1920,
        height: 1080,
    };
    pub const UHD: Self = Self {
        width: 3840,
        height: 2160,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Bytes in one row of packed 4-byte pixels.
    pub fn row_bytes(self) -> usize {
        (self.width as usize).saturating_mul(4)
    }

    /// Byte size of a whole packed 4-byte frame.
    ///
    /// Saturates on dimensions too large to address, so a downstream
    /// allocation fails instead of sizing a wrapped buffer.
    pub fn frame_bytes(self) -> usize {
        self.row_bytes().saturating_mul(self.height as usize)
    }

    /// Whether rows of 4-byte pixels land on the 32-byte boundary the
    /// compression path reads with aligned loads (width divisible by 8).
    pub fn is_stream_aligned(self) -> bool {
        self.width.is_multiple_of(8)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_byte_sizes() {
        let hd = Resolution::HD;
        assert_eq!(hd.row_bytes(), 1920 * 4);
        assert_eq!(hd.frame_bytes(), 1920 * 1080 * 4);
        assert_eq!(hd.pixel_count(), 1920 * 1080);
    }

    #[test]
    fn frame_bytes_saturates_on_absurd_dimensions() {
        // 2^31 x 2^31 passes the nonzero and alignment checks but cannot be
        // addressed; the byte count must pin at the top, not wrap small.
        let huge = Resolution::new(2_147_483_648, 2_147_483_648);
        assert!(huge.is_stream_aligned());
        assert_eq!(huge.frame_bytes(), usize::MAX);
    }

    #[test]
    fn stream_alignment() {
        assert!(Resolution::HD.is_stream_aligned());
        assert!(Resolution::UHD.is_stream_aligned());
        assert!(Resolution::new(640, 480).is_stream_aligned());
        // Common laptop panel width that does not divide by 8.
        assert!(!Resolution::new(1366, 768).is_stream_aligned());
    }

    #[test]
    fn resolution_display() {
        assert_eq!(Resolution::HD.to_string(), "1920x1080");
        assert_eq!(Resolution::new(0, 0).to_string(), "0x0");
    }
}
