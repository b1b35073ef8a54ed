//! Recording session state machine.
//!
//! `EncoderSession` owns one recording: the working frame, the compression
//! engine, and the output sink. Frames go in one at a time; packets come out
//! through the engine's receive loop and land in the file in emission order.
//! One session writes one file, then closes.
//!
//! # State machine
//!
//! ```text
//! Uninitialized -> Initializing -> Ready -> Encoding -> Flushing -> Closed
//! ```
//!
//! `Failed` is reachable from any operation whose engine, IO, or allocation
//! step fails; it keeps a diagnostic and rejects everything except cleanup.
//! Precondition violations (wrong state, mismatched frame) are plain errors
//! that leave the state alone -- only real failures are terminal.
//!
//! # Usage
//!
//! ```ignore
//! let config = EncoderConfig::new(Resolution::HD, 30);
//! let mut session = EncoderSession::create_zdelta(&config, &path)?;
//!
//! for view in staged_frames {
//!     session.encode_frame(view)?;
//! }
//! session.flush()?;
//! ```

use std::path::Path;

use kine_common::STREAM_PIXEL_FORMAT;
use kine_common::config::EncoderConfig;
use kine_common::engine::{CompressionEngine, PacketStatus};
use kine_common::error::{EncodeError, EncodeResult};
use kine_common::frame::{PixelBuffer, PixelView};

use tracing::{debug, error, info, warn};

use crate::sink::BitstreamSink;
use crate::zdelta::ZdeltaEngine;

/// Lifecycle state of an encoder session.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Encoding,
    Flushing,
    Closed,
    Failed,
}

impl SessionState {
    /// Short name for diagnostics and `InvalidState` errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initializing => "initializing",
            Self::Ready => "ready",
            Self::Encoding => "encoding",
            Self::Flushing => "flushing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

/// One recording: engine, working frame, and output file.
pub struct EncoderSession {
    state: SessionState,
    config: EncoderConfig,
    engine: Option<Box<dyn CompressionEngine>>,
    /// Staging copy of the frame being submitted; also what `pixel_view`
    /// exposes for previews.
    working: Option<PixelBuffer>,
    sink: Option<BitstreamSink>,
    frames_submitted: u64,
    /// Diagnostic from the failure that moved the session to `Failed`.
    last_error: Option<String>,
}

impl std::fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncoderSession")
            .field("state", &self.state)
            .field("resolution", &self.config.resolution)
            .field("fps", &self.config.fps)
            .field("frames_submitted", &self.frames_submitted)
            .field("has_engine", &self.engine.is_some())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl EncoderSession {
    /// Create a session around the given engine, writing to `path`.
    ///
    /// Validates the config, allocates the working frame, and opens the
    /// output file (truncating). On error the partially built session tears
    /// itself down and nothing is leaked.
    pub fn create(
        config: &EncoderConfig,
        engine: Box<dyn CompressionEngine>,
        path: &Path,
    ) -> EncodeResult<Self> {
        let mut session = Self {
            state: SessionState::Uninitialized,
            config: config.clone(),
            engine: None,
            working: None,
            sink: None,
            frames_submitted: 0,
            last_error: None,
        };

        config.validate()?;
        session.state = SessionState::Initializing;
        debug!(state = session.state.name(), "Encoder session initializing");

        session.working = Some(PixelBuffer::alloc(config.resolution, STREAM_PIXEL_FORMAT)?);
        session.sink = Some(BitstreamSink::create(path)?);
        session.engine = Some(engine);
        session.state = SessionState::Ready;

        info!(
            resolution = %config.resolution,
            fps = config.fps,
            gop = config.gop_size,
            reorder = config.reorder_latency,
            preset = ?config.preset,
            path = %path.display(),
            "Encoder session created"
        );
        Ok(session)
    }

    /// Create a session wired to the built-in zdelta engine.
    pub fn create_zdelta(config: &EncoderConfig, path: &Path) -> EncodeResult<Self> {
        let engine = ZdeltaEngine::new(config)?;
        Self::create(config, Box::new(engine), path)
    }

    /// Copy one frame in, stamp it, submit it, and drain the engine.
    ///
    /// The view is copied into the session's working frame; the caller's
    /// buffer is free for reuse the moment this returns. Timestamps are
    /// assigned here, one per submitted frame, contiguous from zero.
    pub fn encode_frame(&mut self, view: PixelView<'_>) -> EncodeResult<()> {
        match self.state {
            SessionState::Ready | SessionState::Encoding => {}
            other => {
                return Err(EncodeError::InvalidState {
                    operation: "encode frame",
                    state: other.name(),
                });
            }
        }

        let pts = self.frames_submitted;
        let submitted = match (self.working.as_mut(), self.engine.as_mut()) {
            (Some(working), Some(engine)) => {
                // A mismatched frame is a caller bug: reject it and leave the
                // session usable.
                if let Err(err) = working.copy_from(view) {
                    warn!(error = %err, "Rejected frame that does not match the session");
                    return Err(err.into());
                }
                engine.submit_frame(working, pts)
            }
            _ => {
                return Err(EncodeError::InvalidState {
                    operation: "encode frame",
                    state: "cleaned up",
                });
            }
        };
        submitted.map_err(|err| self.fail("engine rejected frame", err))?;

        self.frames_submitted += 1;
        self.state = SessionState::Encoding;
        debug!(frame = self.frames_submitted, pts, "Submitted frame");

        self.drain(false)
    }

    /// Submit end of stream, drain held-back packets, and close the file.
    ///
    /// Flushing an already closed session is a no-op. Flushing with zero
    /// submitted frames is legal and produces a valid empty stream.
    pub fn flush(&mut self) -> EncodeResult<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        match self.state {
            SessionState::Ready | SessionState::Encoding => {}
            other => {
                return Err(EncodeError::InvalidState {
                    operation: "flush",
                    state: other.name(),
                });
            }
        }

        self.state = SessionState::Flushing;
        let ended = match self.engine.as_mut() {
            Some(engine) => engine.submit_end_of_stream(),
            None => {
                return Err(EncodeError::InvalidState {
                    operation: "flush",
                    state: "cleaned up",
                });
            }
        };
        ended.map_err(|err| self.fail("engine end of stream failed", err))?;

        self.drain(true)?;
        self.state = SessionState::Closed;
        info!(
            frames = self.frames_submitted,
            bytes = self.bytes_written(),
            "Encoder session flushed and closed"
        );
        Ok(())
    }

    /// Release the engine, working frame, and sink, and reset the frame
    /// counter. Safe to call repeatedly; each handle is taken at most once,
    /// and dropping the session runs the same cleanup.
    pub fn clean_up(&mut self) {
        if let Some(engine) = self.engine.take() {
            drop(engine);
            debug!("Released compression engine");
        }
        if let Some(working) = self.working.take() {
            drop(working);
            debug!("Released working frame");
        }
        if let Some(mut sink) = self.sink.take() {
            if let Err(err) = sink.finalize() {
                warn!(error = %err, "Sink close failed during cleanup");
            }
        }
        self.frames_submitted = 0;
        // A failed session keeps its state and diagnostic.
        if self.state != SessionState::Failed {
            self.state = SessionState::Closed;
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Frames submitted since creation (or the last cleanup).
    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    pub fn packets_written(&self) -> u64 {
        self.sink.as_ref().map_or(0, BitstreamSink::packets_written)
    }

    pub fn bytes_written(&self) -> u64 {
        self.sink.as_ref().map_or(0, BitstreamSink::bytes_written)
    }

    /// Diagnostic from the most recent terminal failure, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Read-only view of the working frame (the last submitted image), or
    /// `None` once cleaned up.
    pub fn pixel_view(&self) -> Option<PixelView<'_>> {
        self.working.as_ref().map(PixelBuffer::as_view)
    }

    /// Record a terminal failure and hand the error back for propagation.
    fn fail(&mut self, context: &str, err: EncodeError) -> EncodeError {
        let message = format!("{context}: {err}");
        error!(error = %message, "Encoder session failed");
        self.last_error = Some(message);
        self.state = SessionState::Failed;
        err
    }

    /// Pull packets until the engine runs dry, appending each to the sink.
    ///
    /// Outside a flush, `NeedsMoreInput` hands control back to the caller
    /// and an early `EndOfStream` just stops the loop (the engine refuses
    /// further frames itself). During a flush, either way the engine has
    /// nothing more for this file, so the sink is finalized.
    fn drain(&mut self, flushing: bool) -> EncodeResult<()> {
        loop {
            let status = match self.engine.as_mut() {
                Some(engine) => engine.receive_packet(),
                None => {
                    return Err(EncodeError::InvalidState {
                        operation: "drain packets",
                        state: "cleaned up",
                    });
                }
            };
            let status = status.map_err(|err| self.fail("engine receive failed", err))?;

            match status {
                PacketStatus::Packet(packet) => {
                    let written = match self.sink.as_mut() {
                        Some(sink) => sink.write_packet(&packet),
                        None => {
                            return Err(EncodeError::InvalidState {
                                operation: "write packet",
                                state: "cleaned up",
                            });
                        }
                    };
                    written.map_err(|err| self.fail("sink write failed", err))?;
                    debug!(
                        pts = packet.pts,
                        size = packet.data.len(),
                        keyframe = packet.is_keyframe,
                        "Wrote packet"
                    );
                }
                PacketStatus::NeedsMoreInput | PacketStatus::EndOfStream => {
                    if flushing {
                        self.close_sink()?;
                    }
                    return Ok(());
                }
            }
        }
    }

    fn close_sink(&mut self) -> EncodeResult<()> {
        let result = match self.sink.as_mut() {
            Some(sink) => sink.finalize(),
            None => Ok(()),
        };
        result.map_err(|err| self.fail("sink finalize failed", err))
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        self.clean_up();
    }
}

// ── Tests ────────────────────────────────────────────────────────────
