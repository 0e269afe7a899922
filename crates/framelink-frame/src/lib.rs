//! Length-prefixed, typed wire frames with two-phase buffers.
//!
//! Every frame on the wire is:
//! - A 2-byte little-endian size counting the whole frame, header included
//! - A 1-byte type tag discriminating the message
//! - Payload fields in an application-defined order per type
//!
//! A [`Frame`] is built field by field, sealed with [`Frame::finalize`], and
//! scanned field by field after receipt. Bounds are checked on every access:
//! writes fail before exceeding the frame's size limit, reads fail before
//! running off the end of the received bytes.

pub mod error;
pub mod frame;
mod read;
mod write;

pub use error::{FrameError, Result};
pub use frame::{
    Frame, ABSOLUTE_MAX_FRAME, DEFAULT_MAX_FRAME, HEADER_SIZE, MIN_FRAME_SIZE, SIZE_PREFIX_LEN,
};
