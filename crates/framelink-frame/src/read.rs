//! Reader-phase field operations.
//!
//! Fixed-width readers fail with [`FrameError::Truncated`] when fewer bytes
//! remain than requested: either the peer sent a malformed frame or the
//! caller mis-decoded a previous field. Truncation is per-frame and does not
//! by itself close a connection; that decision belongs to the dispatch layer.

use bytes::Bytes;

use crate::error::{FrameError, Result};
use crate::frame::Frame;

impl Frame {
    fn check_read(&self, n: usize) -> Result<()> {
        if self.remaining() < n {
            return Err(FrameError::Truncated {
                requested: n,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Read one byte as a boolean: any non-zero value is true.
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an unsigned 8-bit integer.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.check_read(1)?;
        let pos = self.cursor();
        let v = self.bytes()[pos];
        self.set_cursor(pos + 1);
        Ok(v)
    }

    /// Read an unsigned 16-bit little-endian integer.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.check_read(2)?;
        let pos = self.cursor();
        let v = u16::from_le_bytes(self.bytes()[pos..pos + 2].try_into().unwrap());
        self.set_cursor(pos + 2);
        Ok(v)
    }

    /// Read an unsigned 32-bit little-endian integer.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.check_read(4)?;
        let pos = self.cursor();
        let v = u32::from_le_bytes(self.bytes()[pos..pos + 4].try_into().unwrap());
        self.set_cursor(pos + 4);
        Ok(v)
    }

    /// Read an unsigned 64-bit little-endian integer.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.check_read(8)?;
        let pos = self.cursor();
        let v = u64::from_le_bytes(self.bytes()[pos..pos + 8].try_into().unwrap());
        self.set_cursor(pos + 8);
        Ok(v)
    }

    /// Read a NUL-terminated string of at most `max_len` content bytes.
    ///
    /// Scans for a terminator within `max_len` bytes or the remaining frame,
    /// whichever is smaller. If none is found the value is truncated to the
    /// scan window and the cursor is resynchronized: it advances past the
    /// window and then past one terminator byte if one immediately follows,
    /// so a malformed string cannot desynchronize subsequent field reads.
    ///
    /// Invalid UTF-8 is replaced rather than rejected; this layer performs
    /// no encoding validation beyond producing a usable `String`.
    pub fn read_string(&mut self, max_len: usize) -> String {
        let start = self.cursor();
        let window = max_len.min(self.remaining());

        match self.bytes()[start..start + window]
            .iter()
            .position(|&b| b == 0)
        {
            Some(i) => {
                let value = String::from_utf8_lossy(&self.bytes()[start..start + i]).into_owned();
                self.set_cursor(start + i + 1);
                value
            }
            None => {
                let value =
                    String::from_utf8_lossy(&self.bytes()[start..start + window]).into_owned();
                let mut pos = start + window;
                // The terminator may sit exactly at the window boundary;
                // consume it so the cursor lands on the next field.
                if pos < self.len() && self.bytes()[pos] == 0 {
                    pos += 1;
                }
                self.set_cursor(pos);
                value
            }
        }
    }

    /// Read the next `n` raw bytes.
    ///
    /// The length is not on the wire; it comes from a preceding length field
    /// or from [`Frame::remaining`] for a trailing blob.
    pub fn read_bytes(&mut self, n: usize) -> Result<Bytes> {
        self.check_read(n)?;
        let pos = self.cursor();
        let v = Bytes::copy_from_slice(&self.bytes()[pos..pos + n]);
        self.set_cursor(pos + n);
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use crate::frame::Frame;
    use crate::FrameError;

    fn roundtrip(fill: impl FnOnce(&mut Frame)) -> Frame {
        let mut frame = Frame::build(1);
        fill(&mut frame);
        frame.finalize();
        frame
    }

    #[test]
    fn bool_roundtrip() {
        let mut frame = roundtrip(|f| {
            f.write_bool(true).unwrap();
            f.write_bool(false).unwrap();
        });
        assert!(frame.read_bool().unwrap());
        assert!(!frame.read_bool().unwrap());
    }

    #[test]
    fn u8_roundtrip_full_range() {
        for v in [0u8, 1, 0x7F, 0x80, u8::MAX] {
            let mut frame = roundtrip(|f| f.write_u8(v).unwrap());
            assert_eq!(frame.read_u8().unwrap(), v);
        }
    }

    #[test]
    fn u16_roundtrip_full_range() {
        for v in [0u16, 1, 0x00FF, 0xFF00, 0x1234, u16::MAX] {
            let mut frame = roundtrip(|f| f.write_u16(v).unwrap());
            assert_eq!(frame.read_u16().unwrap(), v);
        }
    }

    #[test]
    fn u32_roundtrip_full_range() {
        for v in [0u32, 1, 0x0123_4567, 0x8000_0000, u32::MAX] {
            let mut frame = roundtrip(|f| f.write_u32(v).unwrap());
            assert_eq!(frame.read_u32().unwrap(), v);
        }
    }

    #[test]
    fn u64_roundtrip_full_range() {
        for v in [0u64, 1, 0x0123_4567_89AB_CDEF, 1 << 63, u64::MAX] {
            let mut frame = roundtrip(|f| f.write_u64(v).unwrap());
            assert_eq!(frame.read_u64().unwrap(), v);
        }
    }

    #[test]
    fn signed_values_roundtrip_via_bit_pattern() {
        let v: i32 = -123_456;
        let mut frame = roundtrip(|f| f.write_u32(v as u32).unwrap());
        assert_eq!(frame.read_u32().unwrap() as i32, v);
    }

    #[test]
    fn string_roundtrip() {
        let mut frame = roundtrip(|f| {
            f.write_string("hello").unwrap();
            f.write_string("").unwrap();
            f.write_u8(0xAB).unwrap();
        });
        assert_eq!(frame.read_string(64), "hello");
        assert_eq!(frame.read_string(64), "");
        assert_eq!(frame.read_u8().unwrap(), 0xAB);
    }

    #[test]
    fn mixed_field_roundtrip() {
        let mut frame = roundtrip(|f| {
            f.write_bool(true).unwrap();
            f.write_u32(0xCAFE_F00D).unwrap();
            f.write_string("mixed").unwrap();
            f.write_u64(42).unwrap();
        });
        assert!(frame.read_bool().unwrap());
        assert_eq!(frame.read_u32().unwrap(), 0xCAFE_F00D);
        assert_eq!(frame.read_string(32), "mixed");
        assert_eq!(frame.read_u64().unwrap(), 42);
        assert_eq!(frame.remaining(), 0);
    }

    #[test]
    fn raw_bytes_roundtrip_with_remaining() {
        let blob = [9u8, 8, 7, 6, 5];
        let mut frame = roundtrip(|f| {
            f.write_u8(1).unwrap();
            f.write_bytes(&blob).unwrap();
        });
        assert_eq!(frame.read_u8().unwrap(), 1);
        let n = frame.remaining();
        assert_eq!(frame.read_bytes(n).unwrap().as_ref(), &blob);
    }

    #[test]
    fn truncated_read_reports_remaining() {
        let mut frame = roundtrip(|f| f.write_u16(7).unwrap());
        let err = frame.read_u64().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                requested: 8,
                remaining: 2
            }
        ));
        // The failed read does not move the cursor.
        assert_eq!(frame.read_u16().unwrap(), 7);
    }

    #[test]
    fn read_bytes_past_end_truncated() {
        let mut frame = roundtrip(|f| f.write_bytes(&[1, 2, 3]).unwrap());
        let err = frame.read_bytes(4).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { requested: 4, .. }));
    }

    #[test]
    fn string_truncation_resyncs_to_next_field() {
        // String longer than the scan window; terminator past the boundary.
        let mut frame = roundtrip(|f| {
            f.write_string("abcdef").unwrap();
            f.write_u16(0xBEEF).unwrap();
        });
        let value = frame.read_string(6);
        assert_eq!(value, "abcdef");
        // Window of 6 held no terminator; the one just past it is consumed.
        assert_eq!(frame.read_u16().unwrap(), 0xBEEF);
    }

    #[test]
    fn string_terminator_exactly_at_limit() {
        // Terminator lands at index max_len - 1, the last byte of the window.
        let mut frame = roundtrip(|f| {
            f.write_string("abc").unwrap();
            f.write_u16(0x5A5A).unwrap();
        });
        assert_eq!(frame.read_string(4), "abc");
        assert_eq!(frame.read_u16().unwrap(), 0x5A5A);
    }

    #[test]
    fn string_truncated_value_within_window() {
        let mut frame = roundtrip(|f| {
            f.write_string("abcdef").unwrap();
            f.write_u16(0x0102).unwrap();
        });
        // Window of 3: value is the first three bytes; the cursor stops at
        // the window end and the following byte is not a terminator, so the
        // rest of the malformed string stays in the stream.
        assert_eq!(frame.read_string(3), "abc");
        assert_eq!(frame.read_string(16), "def");
        assert_eq!(frame.read_u16().unwrap(), 0x0102);
    }

    #[test]
    fn string_read_at_frame_end_is_empty() {
        let mut frame = roundtrip(|f| f.write_u8(1).unwrap());
        frame.read_u8().unwrap();
        assert_eq!(frame.read_string(8), "");
        assert_eq!(frame.remaining(), 0);
    }
}
