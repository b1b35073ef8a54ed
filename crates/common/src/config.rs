//! Configuration for encoder sessions and engines.

use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, EncodeResult};
use crate::types::Resolution;

/// Quality mode for the compression engine.
///
/// Only lossless is defined; the field exists so session/engine wiring names
/// the mode explicitly instead of assuming it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityMode {
    #[default]
    Lossless,
}

/// Engine speed vs. compression trade-off.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedPreset {
    Fastest,
    #[default]
    Fast,
    Medium,
    Slow,
}

/// Compression engine configuration.
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    pub resolution: Resolution,
    /// Integer frame rate; screen capture sources tick at whole rates.
    pub fps: u32,
    pub quality: QualityMode,
    /// Frames per keyframe group.
    pub gop_size: u32,
    /// How many finished packets the engine may hold back before releasing
    /// them (models encoder output delay).
    pub reorder_latency: u32,
    /// Advisory engine thread count (0 = engine decides).
    pub thread_hint: u32,
    pub preset: SpeedPreset,
}

impl EncoderConfig {
    /// Config with the recording defaults for the given geometry and rate.
    pub fn new(resolution: Resolution, fps: u32) -> Self {
        Self {
            resolution,
            fps,
            quality: QualityMode::Lossless,
            gop_size: 10,
            reorder_latency: 1,
            thread_hint: 0,
            preset: SpeedPreset::Fast,
        }
    }

    /// Check the config before a session is built around it.
    pub fn validate(&self) -> EncodeResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(EncodeError::InvalidConfig(format!(
                "resolution must be non-empty, got {}",
                self.resolution
            )));
        }
        if !self.resolution.is_stream_aligned() {
            return Err(EncodeError::InvalidConfig(format!(
                "width {} must be a multiple of 8 for aligned rows",
                self.resolution.width
            )));
        }
        if self.fps == 0 {
            return Err(EncodeError::InvalidConfig("fps must be > 0".into()));
        }
        if self.gop_size == 0 {
            return Err(EncodeError::InvalidConfig("gop_size must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_recording_profile() {
        let config = EncoderConfig::new(Resolution::HD, 30);
        assert_eq!(config.quality, QualityMode::Lossless);
        assert_eq!(config.gop_size, 10);
        assert_eq!(config.reorder_latency, 1);
        assert_eq!(config.thread_hint, 0);
        assert_eq!(config.preset, SpeedPreset::Fast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_resolution() {
        let config = EncoderConfig::new(Resolution::new(0, 0), 30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_misaligned_width() {
        let config = EncoderConfig::new(Resolution::new(1366, 768), 30);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_fps() {
        let config = EncoderConfig::new(Resolution::HD, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_gop() {
        let mut config = EncoderConfig::new(Resolution::HD, 30);
        config.gop_size = 0;
        assert!(config.validate().is_err());
    }
}
