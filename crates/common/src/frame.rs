//! Owned frame pixel storage and read-only views.
//!
//! `PixelBuffer` is the unit of frame memory across the pipeline: capture
//! slots, the session working frame, and engine scratch each hold one. Rows
//! are packed 4-byte pixels and every allocation keeps row starts on a
//! 32-byte boundary. With 4-byte pixels that means widths must divide by 8;
//! odd widths are rejected rather than silently padded or cropped.
//!
//! Allocation is fallible: a frame at UHD is ~33 MB and the capture path
//! must surface an allocation failure as an error it can record, not abort.

use std::fmt;

use crate::color::PixelFormat;
use crate::error::FrameError;
use crate::types::Resolution;

/// Row alignment in bytes for every frame allocation.
pub const STRIDE_ALIGN: usize = 32;

/// Owned pixel storage for one frame.
pub struct PixelBuffer {
    resolution: Resolution,
    format: PixelFormat,
    stride: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zero-filled frame.
    ///
    /// Rejects empty dimensions and widths that break row alignment. Memory
    /// is reserved fallibly so an out-of-memory condition comes back as
    /// `FrameError::AllocationFailed`.
    pub fn alloc(resolution: Resolution, format: PixelFormat) -> Result<Self, FrameError> {
        if resolution.width == 0 || resolution.height == 0 {
            return Err(FrameError::InvalidDimensions {
                width: resolution.width,
                height: resolution.height,
            });
        }
        let too_large = || FrameError::InvalidDimensions {
            width: resolution.width,
            height: resolution.height,
        };
        let stride = (resolution.width as usize)
            .checked_mul(format.bytes_per_pixel() as usize)
            .ok_or_else(too_large)?;
        if !stride.is_multiple_of(STRIDE_ALIGN) {
            return Err(FrameError::MisalignedWidth {
                width: resolution.width,
            });
        }

        let len = stride
            .checked_mul(resolution.height as usize)
            .ok_or_else(too_large)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FrameError::AllocationFailed { bytes: len })?;
        data.resize(len, 0);

        Ok(Self {
            resolution,
            format,
            stride,
            data,
        })
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Total byte length of the pixel data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// One row of pixels. Panics if `y` is out of range.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.stride]
    }

    /// One row of pixels, writable. Panics if `y` is out of range.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        &mut self.data[start..start + self.stride]
    }

    /// Borrow the whole frame read-only.
    pub fn as_view(&self) -> PixelView<'_> {
        PixelView {
            resolution: self.resolution,
            format: self.format,
            stride: self.stride,
            bytes: &self.data,
        }
    }

    /// Copy a whole frame in. The source must match this buffer's geometry
    /// and format exactly.
    pub fn copy_from(&mut self, src: PixelView<'_>) -> Result<(), FrameError> {
        if src.resolution != self.resolution {
            return Err(FrameError::ResolutionMismatch {
                expected: self.resolution,
                got: src.resolution,
            });
        }
        if src.format != self.format {
            return Err(FrameError::FormatMismatch {
                expected: self.format,
                got: src.format,
            });
        }
        self.data.copy_from_slice(src.bytes);
        Ok(())
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("resolution", &self.resolution)
            .field("format", &self.format)
            .field("stride", &self.stride)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Read-only borrow of one frame's pixels.
///
/// A view pins the buffer it came from, so a view held across a reallocation
/// or mutation of the owner is a compile error rather than a stale read.
#[derive(Copy, Clone)]
pub struct PixelView<'a> {
    pub resolution: Resolution,
    pub format: PixelFormat,
    pub stride: usize,
    pub bytes: &'a [u8],
}

impl PixelView<'_> {
    /// One row of pixels. Panics if `y` is out of range.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.bytes[start..start + self.stride]
    }
}

impl fmt::Debug for PixelView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelView")
            .field("resolution", &self.resolution)
            .field("format", &self.format)
            .field("stride", &self.stride)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::STREAM_PIXEL_FORMAT;

    #[test]
    fn alloc_hd_frame() {
        let buf = PixelBuffer::alloc(Resolution::HD, STREAM_PIXEL_FORMAT).unwrap();
        assert_eq!(buf.stride(), 1920 * 4);
        assert!(buf.stride().is_multiple_of(STRIDE_ALIGN));
        assert_eq!(buf.len(), Resolution::HD.frame_bytes());
        // Fresh frames are zero-filled.
        assert!(buf.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn alloc_rejects_zero_dimensions() {
        let err = PixelBuffer::alloc(Resolution::new(0, 1080), STREAM_PIXEL_FORMAT).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDimensions { .. }));
        let err = PixelBuffer::alloc(Resolution::new(1920, 0), STREAM_PIXEL_FORMAT).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDimensions { .. }));
    }

    #[test]
    fn alloc_rejects_misaligned_width() {
        let err = PixelBuffer::alloc(Resolution::new(1366, 768), STREAM_PIXEL_FORMAT).unwrap_err();
        assert!(matches!(err, FrameError::MisalignedWidth { width: 1366 }));
    }

    #[test]
    fn alloc_rejects_dimensions_that_overflow() {
        // Aligned and nonzero, but the byte count does not fit in usize.
        let res = Resolution::new(2_147_483_648, 2_147_483_648);
        let err = PixelBuffer::alloc(res, STREAM_PIXEL_FORMAT).unwrap_err();
        assert!(matches!(err, FrameError::InvalidDimensions { .. }));
    }

    #[test]
    fn rows_are_stride_spaced() {
        let res = Resolution::new(64, 8);
        let mut buf = PixelBuffer::alloc(res, STREAM_PIXEL_FORMAT).unwrap();
        buf.row_mut(5).fill(0xAB);

        let view = buf.as_view();
        assert!(view.row(5).iter().all(|&b| b == 0xAB));
        assert!(view.row(4).iter().all(|&b| b == 0));
        assert_eq!(view.row(5).len(), res.row_bytes());
    }

    #[test]
    fn copy_from_matching_frame() {
        let res = Resolution::new(64, 8);
        let mut src = PixelBuffer::alloc(res, STREAM_PIXEL_FORMAT).unwrap();
        src.data_mut().fill(0x5C);

        let mut dst = PixelBuffer::alloc(res, STREAM_PIXEL_FORMAT).unwrap();
        dst.copy_from(src.as_view()).unwrap();
        assert_eq!(dst.data(), src.data());
    }

    #[test]
    fn copy_from_rejects_resolution_mismatch() {
        let mut dst = PixelBuffer::alloc(Resolution::new(64, 8), STREAM_PIXEL_FORMAT).unwrap();
        let src = PixelBuffer::alloc(Resolution::new(128, 8), STREAM_PIXEL_FORMAT).unwrap();
        let err = dst.copy_from(src.as_view()).unwrap_err();
        assert!(matches!(err, FrameError::ResolutionMismatch { .. }));
    }

    #[test]
    fn copy_from_rejects_format_mismatch() {
        let res = Resolution::new(64, 8);
        let mut dst = PixelBuffer::alloc(res, PixelFormat::Bgrx8).unwrap();
        let src = PixelBuffer::alloc(res, PixelFormat::Rgba8).unwrap();
        let err = dst.copy_from(src.as_view()).unwrap_err();
        assert!(matches!(err, FrameError::FormatMismatch { .. }));
    }
}
