//! Exact decode of a zdelta stream.
//!
//! Rebuilds raw frames byte for byte: keyframes replace the canvas, deltas
//! XOR onto it. Used by verification tooling and the round-trip tests;
//! playback would convert frames onward to a display surface from here.

use std::io::{self, Read};

use kine_common::error::{EncodeError, EncodeResult, FrameError};
use kine_common::types::Resolution;

use super::format;

/// Worst-case zstd output for `frame_bytes` of input: source size plus
/// 1/256 overhead plus a small constant. Any packet declaring more than
/// this was not produced by the engine for this resolution.
fn max_payload_len(frame_bytes: usize) -> usize {
    frame_bytes
        .saturating_add(frame_bytes / 256)
        .saturating_add(64)
}

/// Streaming decoder over any byte source.
pub struct ZdeltaDecoder {
    frame_bytes: usize,
    decompressor: zstd::bulk::Decompressor<'static>,
    /// Last reconstructed frame (delta base); empty until the first keyframe.
    canvas: Vec<u8>,
    frames_out: u64,
}

impl ZdeltaDecoder {
    /// Decoder for a stream recorded at the given resolution.
    ///
    /// Geometry travels out of band, so the caller must know it; a payload
    /// that decompresses to the wrong size is rejected.
    pub fn new(resolution: Resolution) -> EncodeResult<Self> {
        let decompressor = zstd::bulk::Decompressor::new()
            .map_err(|e| EncodeError::Engine(format!("zstd context: {e}")))?;
        Ok(Self {
            frame_bytes: resolution.frame_bytes(),
            decompressor,
            canvas: Vec::new(),
            frames_out: 0,
        })
    }

    /// Decode the next frame's raw bytes. `Ok(None)` at clean end of stream.
    ///
    /// The declared payload length is checked against the stream's
    /// compression bound before any payload memory is touched, so a corrupt
    /// length field is an `InvalidData` error, not a giant allocation.
    pub fn next_frame<R: Read>(&mut self, reader: &mut R) -> EncodeResult<Option<Vec<u8>>> {
        let header = match format::read_header(reader)? {
            Some(header) => header,
            None => return Ok(None),
        };

        let len = header.payload_len as usize;
        let bound = max_payload_len(self.frame_bytes);
        if len > bound {
            return Err(EncodeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "frame {} declares a {len} byte payload, over the {bound} byte bound for this resolution",
                    header.pts
                ),
            )));
        }

        let mut payload = Vec::new();
        payload
            .try_reserve_exact(len)
            .map_err(|_| FrameError::AllocationFailed { bytes: len })?;
        payload.resize(len, 0);
        reader.read_exact(&mut payload)?;

        let raw = self
            .decompressor
            .decompress(&payload, self.frame_bytes)
            .map_err(|e| EncodeError::Engine(format!("zstd decompress: {e}")))?;
        if raw.len() != self.frame_bytes {
            return Err(EncodeError::Engine(format!(
                "frame {} decompressed to {} bytes, expected {}",
                header.pts,
                raw.len(),
                self.frame_bytes
            )));
        }

        if header.keyframe {
            self.canvas = raw;
        } else {
            if self.canvas.is_empty() {
                return Err(EncodeError::Engine(format!(
                    "delta frame {} before any keyframe",
                    header.pts
                )));
            }
            for (c, d) in self.canvas.iter_mut().zip(&raw) {
                *c ^= d;
            }
        }

        self.frames_out += 1;
        Ok(Some(self.canvas.clone()))
    }

    /// Frames decoded so far.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_out
    }
}
