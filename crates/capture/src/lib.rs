//! `kine-capture` — Frame staging between a capture source and the encoder.
//!
//! Capture front ends produce frames faster than the encoder wants to be
//! poked, and the frame a source is painting into must never be the frame
//! the encoder is reading. This crate provides the two pieces that sit on
//! that boundary:
//!
//! - **Cycle**: `FrameCycle`, a two-slot recycling buffer with lazy
//!   reallocation on resize
//! - **Source**: `CaptureSource`, the trait a platform capture front end
//!   implements

pub mod cycle;
pub mod source;

pub use cycle::{CYCLE_DEPTH, FrameCycle};
pub use source::CaptureSource;
