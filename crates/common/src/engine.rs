//! Compression engine abstraction.
//!
//! The session programs against `CompressionEngine`, not a concrete codec.
//! Packets come back through `receive_packet` because submissions and
//! outputs are not one-to-one: an engine may hold frames for reordering and
//! release several packets at once, or none until more input arrives.

use crate::error::EncodeResult;
use crate::frame::PixelBuffer;

/// An encoded bitstream packet produced by an engine.
#[derive(Clone, Debug)]
pub struct EncodedPacket {
    pub data: Vec<u8>,
    /// Frame-index presentation timestamp, assigned at submission.
    pub pts: u64,
    pub is_keyframe: bool,
}

/// Result of asking an engine for its next packet.
#[derive(Clone, Debug)]
pub enum PacketStatus {
    /// One finished packet. Ask again; more may be ready.
    Packet(EncodedPacket),
    /// Nothing ready; the engine wants more frames (or end of stream) first.
    NeedsMoreInput,
    /// The engine has emitted everything it ever will. Only seen after
    /// `submit_end_of_stream`, and repeats forever once reached.
    EndOfStream,
}

/// Lossless frame compression engine.
///
/// An engine consumes the frame during `submit_frame`; the caller may reuse
/// the buffer as soon as it returns. Submitting anything after
/// `submit_end_of_stream` is an error.
pub trait CompressionEngine: Send {
    /// Hand one frame to the engine, stamped with its presentation timestamp.
    fn submit_frame(&mut self, frame: &PixelBuffer, pts: u64) -> EncodeResult<()>;

    /// Signal that no more frames are coming.
    fn submit_end_of_stream(&mut self) -> EncodeResult<()>;

    /// Pull the next finished packet, if any.
    fn receive_packet(&mut self) -> EncodeResult<PacketStatus>;
}
