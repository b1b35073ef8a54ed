//! Capture source abstraction.
//!
//! Platform capture front ends (display duplication APIs, compositor hooks)
//! implement this trait and stay out of the staging and encoding crates.
//! None ships here; tests drive the pipeline with synthetic sources.

use kine_common::error::EncodeResult;
use kine_common::frame::PixelBuffer;
use kine_common::types::Resolution;

/// A producer of captured screen frames.
pub trait CaptureSource: Send {
    /// Native resolution of the surface being captured.
    fn resolution(&self) -> Resolution;

    /// Fill `frame` with the next captured image.
    ///
    /// The buffer is allocated at `resolution()` in the stream pixel format;
    /// the implementation overwrites every row.
    fn fill_frame(&mut self, frame: &mut PixelBuffer) -> EncodeResult<()>;
}
