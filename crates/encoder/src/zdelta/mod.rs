//! Built-in lossless software engine.
//!
//! Screen content barely changes between frames, so the stream splits into
//! keyframes (whole frame, zstd) and delta frames (byte-wise XOR against the
//! previous frame, zstd). Deltas of a mostly static desktop are almost all
//! zeros and collapse to a few hundred bytes, while decode recovers every
//! byte exactly.
//!
//! # Module Structure
//!
//! - [`format`] -- packet framing shared by engine and decoder.
//! - [`decode`] -- `ZdeltaDecoder`, exact byte recovery for verification.
//! - [`ZdeltaEngine`] -- the `CompressionEngine` implementation.
//!
//! The engine honors `reorder_latency` by holding that many finished packets
//! back until more input arrives or the stream ends, so downstream code sees
//! the same submit/receive rhythm a reordering hardware encoder produces.

pub mod decode;
pub mod format;

pub use decode::ZdeltaDecoder;

use std::collections::VecDeque;

use kine_common::config::{EncoderConfig, SpeedPreset};
use kine_common::engine::{CompressionEngine, EncodedPacket, PacketStatus};
use kine_common::error::{EncodeError, EncodeResult, FrameError};
use kine_common::frame::PixelBuffer;

use tracing::{debug, info};

use self::format::PacketHeader;

/// zstd level for each speed preset.
fn compression_level(preset: SpeedPreset) -> i32 {
    match preset {
        SpeedPreset::Fastest => 1,
        SpeedPreset::Fast => 3,
        SpeedPreset::Medium => 10,
        SpeedPreset::Slow => 19,
    }
}

/// Software lossless engine: zstd keyframes + XOR delta frames.
pub struct ZdeltaEngine {
    frame_bytes: usize,
    gop_size: u64,
    reorder_latency: usize,
    compressor: zstd::bulk::Compressor<'static>,
    /// Raw bytes of the previously submitted frame (delta base).
    previous: Vec<u8>,
    /// XOR scratch, reused between submissions.
    delta: Vec<u8>,
    /// Finished packets not yet released downstream.
    pending: VecDeque<EncodedPacket>,
    frames_in: u64,
    ended: bool,
}

impl ZdeltaEngine {
    /// Build an engine for one session's geometry.
    pub fn new(config: &EncoderConfig) -> EncodeResult<Self> {
        config.validate()?;
        let frame_bytes = config.resolution.frame_bytes();
        let level = compression_level(config.preset);

        let compressor = zstd::bulk::Compressor::new(level)
            .map_err(|e| EncodeError::Engine(format!("zstd context: {e}")))?;
        let previous = alloc_scratch(frame_bytes)?;
        let delta = alloc_scratch(frame_bytes)?;

        info!(
            resolution = %config.resolution,
            gop = config.gop_size,
            reorder = config.reorder_latency,
            level,
            threads = config.thread_hint,
            "zdelta engine created"
        );

        Ok(Self {
            frame_bytes,
            gop_size: config.gop_size as u64,
            reorder_latency: config.reorder_latency as usize,
            compressor,
            previous,
            delta,
            pending: VecDeque::new(),
            frames_in: 0,
            ended: false,
        })
    }

    /// Frames submitted so far.
    pub fn frames_in(&self) -> u64 {
        self.frames_in
    }
}

fn alloc_scratch(bytes: usize) -> EncodeResult<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes)
        .map_err(|_| EncodeError::Frame(FrameError::AllocationFailed { bytes }))?;
    buf.resize(bytes, 0);
    Ok(buf)
}

impl CompressionEngine for ZdeltaEngine {
    fn submit_frame(&mut self, frame: &PixelBuffer, pts: u64) -> EncodeResult<()> {
        if self.ended {
            return Err(EncodeError::Engine(
                "frame submitted after end of stream".into(),
            ));
        }
        let raw = frame.data();
        if raw.len() != self.frame_bytes {
            return Err(EncodeError::Engine(format!(
                "frame is {} bytes, engine expects {}",
                raw.len(),
                self.frame_bytes
            )));
        }

        let keyframe = self.frames_in.is_multiple_of(self.gop_size);
        let compressed = if keyframe {
            self.compressor.compress(raw)
        } else {
            for ((d, cur), prev) in self.delta.iter_mut().zip(raw).zip(&self.previous) {
                *d = cur ^ prev;
            }
            self.compressor.compress(&self.delta)
        };
        let payload = compressed.map_err(|e| EncodeError::Engine(format!("zstd compress: {e}")))?;

        let mut data = Vec::with_capacity(format::HEADER_LEN + payload.len());
        let header = PacketHeader {
            keyframe,
            pts,
            payload_len: payload.len() as u32,
        };
        format::write_packet(&mut data, &header, &payload)
            .map_err(|e| EncodeError::Engine(format!("packet framing: {e}")))?;

        self.previous.copy_from_slice(raw);
        self.frames_in += 1;
        self.pending.push_back(EncodedPacket {
            data,
            pts,
            is_keyframe: keyframe,
        });

        debug!(pts, keyframe, payload = payload.len(), "Compressed frame");
        Ok(())
    }

    fn submit_end_of_stream(&mut self) -> EncodeResult<()> {
        self.ended = true;
        debug!(frames = self.frames_in, "End of stream");
        Ok(())
    }

    fn receive_packet(&mut self) -> EncodeResult<PacketStatus> {
        // Keep `reorder_latency` packets back until the stream ends.
        let held_back = if self.ended { 0 } else { self.reorder_latency };
        if self.pending.len() > held_back {
            if let Some(packet) = self.pending.pop_front() {
                return Ok(PacketStatus::Packet(packet));
            }
        }

        if self.ended {
            Ok(PacketStatus::EndOfStream)
        } else {
            Ok(PacketStatus::NeedsMoreInput)
        }
    }
}
