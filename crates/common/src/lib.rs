//! `kine-common` — Shared types, traits, and errors for the kinescope recording engine.
//!
//! This crate is the foundation that the capture and encoder crates depend on.
//! It defines the core abstractions:
//!
//! - **Types**: `Resolution` (frame geometry and byte-size math)
//! - **Color**: `PixelFormat`, `STREAM_PIXEL_FORMAT` (packed 4-byte formats)
//! - **Frames**: `PixelBuffer`, `PixelView` (owned frame storage + borrowed views)
//! - **Engine**: `CompressionEngine`, `EncodedPacket`, `PacketStatus` (engine seam)
//! - **Errors**: `FrameError`, `EncodeError` (thiserror-based)
//! - **Config**: `EncoderConfig`, `QualityMode`, `SpeedPreset`

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod frame;
pub mod types;

// Re-export commonly used items at crate root
pub use color::{PixelFormat, STREAM_PIXEL_FORMAT};
pub use config::{EncoderConfig, QualityMode, SpeedPreset};
pub use engine::{CompressionEngine, EncodedPacket, PacketStatus};
pub use error::{EncodeError, EncodeResult, FrameError};
pub use frame::{PixelBuffer, PixelView, STRIDE_ALIGN};
pub use types::Resolution;
