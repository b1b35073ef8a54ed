//! `kine-encoder` -- Recording sessions, bitstream output, and the built-in
//! lossless engine.
//!
//! # Architecture
//!
//! - [`session`] -- `EncoderSession`, the state machine owning one recording
//! - [`sink`] -- `BitstreamSink`, append-only buffered file output
//! - [`zdelta`] -- software lossless engine (zstd keyframes + XOR deltas)
//!   - [`zdelta::format`] -- packet framing shared by engine and decoder
//!   - [`zdelta::decode`] -- `ZdeltaDecoder`, exact byte recovery
//!
//! # Encode Pipeline
//!
//! ```text
//! PixelView (staged capture frame)
//!   --> copy into session working frame, stamp pts
//!     --> CompressionEngine::submit_frame
//!       --> receive_packet loop (0..n packets per submission)
//!         --> BitstreamSink append, in emission order
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use kine_encoder::session::EncoderSession;
//! use kine_common::{EncoderConfig, Resolution};
//!
//! let config = EncoderConfig::new(Resolution::HD, 30);
//! let mut session = EncoderSession::create_zdelta(&config, &path)?;
//!
//! for view in staged_frames {
//!     session.encode_frame(view)?;
//! }
//!
//! // Flush held-back packets and close the file
//! session.flush()?;
//! ```

pub mod session;
pub mod sink;
pub mod zdelta;

pub use session::{EncoderSession, SessionState};
pub use sink::BitstreamSink;
pub use zdelta::{ZdeltaDecoder, ZdeltaEngine};
