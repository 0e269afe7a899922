//! Builder-phase field operations.
//!
//! Every writer appends at the end of the buffer and fails with
//! [`FrameError::CapacityExceeded`] if the append would push the wire size
//! past the frame's limit; nothing is appended on failure. Callers adding
//! variable-length content (strings, blobs) should pre-check with
//! [`Frame::can_write`].

use bytes::BufMut;

use crate::error::{FrameError, Result};
use crate::frame::Frame;

impl Frame {
    /// Whether `n` more bytes fit under the frame's size limit.
    pub fn can_write(&self, n: usize) -> bool {
        self.len() + n <= self.limit()
    }

    fn check_write(&self, n: usize) -> Result<()> {
        assert!(
            !self.is_finalized(),
            "writer operation on a finalized frame"
        );
        if !self.can_write(n) {
            return Err(FrameError::CapacityExceeded {
                requested: n,
                len: self.len(),
                limit: self.limit(),
            });
        }
        Ok(())
    }

    /// Append a boolean as one byte: `1` for true, `0` for false.
    pub fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_u8(u8::from(v))
    }

    /// Append an unsigned 8-bit integer.
    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.check_write(1)?;
        self.bytes_mut().put_u8(v);
        Ok(())
    }

    /// Append an unsigned 16-bit integer, little-endian.
    pub fn write_u16(&mut self, v: u16) -> Result<()> {
        self.check_write(2)?;
        self.bytes_mut().put_u16_le(v);
        Ok(())
    }

    /// Append an unsigned 32-bit integer, little-endian.
    pub fn write_u32(&mut self, v: u32) -> Result<()> {
        self.check_write(4)?;
        self.bytes_mut().put_u32_le(v);
        Ok(())
    }

    /// Append an unsigned 64-bit integer, little-endian.
    pub fn write_u64(&mut self, v: u64) -> Result<()> {
        self.check_write(8)?;
        self.bytes_mut().put_u64_le(v);
        Ok(())
    }

    /// Append the bytes of `s` followed by a single NUL terminator.
    ///
    /// No length prefix and no encoding conversion; `s` must not contain an
    /// embedded NUL.
    pub fn write_string(&mut self, s: &str) -> Result<()> {
        debug_assert!(
            !s.as_bytes().contains(&0),
            "string written to a frame must not contain an embedded NUL"
        );
        self.check_write(s.len() + 1)?;
        self.bytes_mut().put_slice(s.as_bytes());
        self.bytes_mut().put_u8(0);
        Ok(())
    }

    /// Append a raw byte range with no length prefix.
    ///
    /// The receiver must know the length out of band: either from a
    /// preceding length field or by consuming the remainder of the frame.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.check_write(buf.len())?;
        self.bytes_mut().put_slice(buf);
        Ok(())
    }
}
