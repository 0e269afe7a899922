use bytes::BytesMut;

use crate::error::{FrameError, Result};

/// Width of the little-endian size prefix.
pub const SIZE_PREFIX_LEN: usize = 2;

/// Frame header: size prefix (2) + type tag (1) = 3 bytes.
pub const HEADER_SIZE: usize = 3;

/// Smallest valid frame: a header with an empty payload.
pub const MIN_FRAME_SIZE: usize = HEADER_SIZE;

/// Default frame size ceiling. Conservative enough to fit one frame in a
/// single MTU-sized segment on common links.
pub const DEFAULT_MAX_FRAME: usize = 1460;

/// Hard ceiling imposed by the u16 size prefix.
pub const ABSOLUTE_MAX_FRAME: usize = u16::MAX as usize;

/// One length-prefixed, typed unit of the wire protocol.
///
/// A frame is a single entity with two mutually exclusive usage phases:
/// while being *built* it is append-only, and [`Frame::finalize`] converts it
/// in place into a *reader* whose field operations scan the written bytes.
/// Inbound frames are assembled incrementally from socket reads and handed
/// out already in reader phase.
///
/// Wire layout:
///
/// ```text
/// ┌────────────────┬───────────┬──────────────────────┐
/// │ Size (2B LE)   │ Type (1B) │ Payload               │
/// │ whole frame,   │           │ (Size - 3 bytes)      │
/// │ header incl.   │           │                       │
/// └────────────────┴───────────┴──────────────────────┘
/// ```
///
/// The size counts the entire frame including the header, so it is always at
/// least [`MIN_FRAME_SIZE`]. Multi-byte integers are little-endian regardless
/// of host byte order.
#[derive(Debug)]
pub struct Frame {
    buf: BytesMut,
    /// Read cursor in reader phase; bytes received so far during inbound
    /// assembly. Unused while building (the write cursor is the buffer end).
    pos: usize,
    limit: usize,
    finalized: bool,
}

impl Frame {
    /// Begin building a frame of the given type with the default size limit.
    pub fn build(frame_type: u8) -> Self {
        Self::build_with_limit(frame_type, DEFAULT_MAX_FRAME)
    }

    /// Begin building a frame of the given type with an explicit size limit.
    ///
    /// The limit is the total wire size including the 3-byte header and must
    /// lie in `[MIN_FRAME_SIZE, ABSOLUTE_MAX_FRAME]`.
    pub fn build_with_limit(frame_type: u8, limit: usize) -> Self {
        assert!(
            (MIN_FRAME_SIZE..=ABSOLUTE_MAX_FRAME).contains(&limit),
            "frame size limit {limit} outside [{MIN_FRAME_SIZE}, {ABSOLUTE_MAX_FRAME}]"
        );
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + 32);
        // Size prefix is patched in by finalize(); reserve its slot now.
        buf.extend_from_slice(&[0, 0, frame_type]);
        Self {
            buf,
            pos: 0,
            limit,
            finalized: false,
        }
    }

    /// Create an empty frame to be assembled from socket reads.
    ///
    /// The buffer starts sized for just the size prefix so a stream read
    /// never pulls in bytes belonging to the next frame.
    pub fn for_receive(limit: usize) -> Self {
        assert!(
            (MIN_FRAME_SIZE..=ABSOLUTE_MAX_FRAME).contains(&limit),
            "frame size limit {limit} outside [{MIN_FRAME_SIZE}, {ABSOLUTE_MAX_FRAME}]"
        );
        let mut buf = BytesMut::with_capacity(HEADER_SIZE);
        buf.resize(SIZE_PREFIX_LEN, 0);
        Self {
            buf,
            pos: 0,
            limit,
            finalized: false,
        }
    }

    /// Patch the size prefix and convert this frame in place into a reader.
    ///
    /// After this the frame is immutable wire data: calling any writer
    /// operation is a contract violation.
    pub fn finalize(&mut self) {
        assert!(!self.finalized, "finalize() called twice on the same frame");
        let size = self.buf.len() as u16;
        self.buf[0..SIZE_PREFIX_LEN].copy_from_slice(&size.to_le_bytes());
        self.pos = HEADER_SIZE;
        self.finalized = true;
    }

    /// Whether this frame has been finalized (or fully received).
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The frame's type tag. Not part of the field stream; reading it does
    /// not move the cursor.
    pub fn frame_type(&self) -> u8 {
        debug_assert!(self.buf.len() >= HEADER_SIZE);
        self.buf[SIZE_PREFIX_LEN]
    }

    /// Current wire size of the frame in bytes, header included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the frame holds no bytes at all. Never true for a built
    /// frame, which always carries its header.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The size ceiling fixed at construction.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Bytes left between the read cursor and the end of the frame.
    ///
    /// Callers reading a trailing raw blob of implicit length use this to
    /// size the final [`Frame::read_bytes`] call.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The complete wire bytes of a finalized frame.
    pub fn as_wire(&self) -> &[u8] {
        debug_assert!(self.finalized, "as_wire() on a frame still being built");
        &self.buf
    }

    pub(crate) fn cursor(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_cursor(&mut self, pos: usize) {
        debug_assert!(pos <= self.buf.len());
        self.pos = pos;
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    // ---- inbound assembly -------------------------------------------------
    //
    // While a frame is being received, `pos` tracks how many bytes have
    // arrived so far. A partial read is resumed by reading into `unfilled()`
    // again on the next scheduler turn; nothing is ever re-read or dropped.

    /// Whether the size prefix has not been fully received yet.
    pub fn pending_header(&self) -> bool {
        self.pos < SIZE_PREFIX_LEN
    }

    /// Whether the declared size has been parsed and the body buffer grown.
    pub fn body_started(&self) -> bool {
        self.buf.len() > SIZE_PREFIX_LEN
    }

    /// Decode the received size prefix, validate it, and grow the buffer to
    /// the declared frame size.
    ///
    /// A declared size below [`MIN_FRAME_SIZE`] or above the limit means the
    /// stream contains garbage and can no longer be trusted to be
    /// frame-aligned; the caller must tear the connection down.
    pub fn parse_declared_size(&mut self) -> Result<usize> {
        debug_assert!(!self.pending_header());
        let size = u16::from_le_bytes([self.buf[0], self.buf[1]]) as usize;
        if !(MIN_FRAME_SIZE..=self.limit).contains(&size) {
            return Err(FrameError::InvalidSize {
                size,
                min: MIN_FRAME_SIZE,
                max: self.limit,
            });
        }
        self.buf.resize(size, 0);
        Ok(size)
    }

    /// The not-yet-received tail of the buffer, to be filled by the next
    /// socket read.
    pub fn unfilled(&mut self) -> &mut [u8] {
        let pos = self.pos;
        &mut self.buf[pos..]
    }

    /// Record that `n` more bytes have been received.
    pub fn mark_received(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.buf.len());
        self.pos += n;
    }

    /// Whether the whole declared frame has been received.
    pub fn is_complete(&self) -> bool {
        self.buf.len() >= MIN_FRAME_SIZE && self.pos == self.buf.len()
    }

    /// Convert a fully received frame into reader phase, with the cursor
    /// reset past the header.
    pub fn prepare_to_read(&mut self) {
        debug_assert!(self.is_complete());
        self.pos = HEADER_SIZE;
        self.finalized = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_frame_starts_with_header() {
        let frame = Frame::build(7);
        assert_eq!(frame.len(), HEADER_SIZE);
        assert_eq!(frame.frame_type(), 7);
        assert!(!frame.is_finalized());
    }

    #[test]
    fn finalize_patches_size_prefix() {
        let mut frame = Frame::build(1);
        frame.write_u32(0xDEAD_BEEF).unwrap();
        frame.finalize();

        let wire = frame.as_wire();
        let size = u16::from_le_bytes([wire[0], wire[1]]) as usize;
        assert_eq!(size, wire.len());
        assert_eq!(size, HEADER_SIZE + 4);
    }

    #[test]
    #[should_panic(expected = "finalize() called twice")]
    fn finalize_twice_panics() {
        let mut frame = Frame::build(1);
        frame.finalize();
        frame.finalize();
    }

    #[test]
    #[should_panic(expected = "size limit")]
    fn limit_below_minimum_rejected() {
        let _ = Frame::build_with_limit(1, 2);
    }

    #[test]
    fn receive_assembly_tracks_progress() {
        let mut sender = Frame::build(9);
        sender.write_u16(0x1234).unwrap();
        sender.finalize();
        let wire = sender.as_wire().to_vec();

        let mut frame = Frame::for_receive(DEFAULT_MAX_FRAME);
        assert!(frame.pending_header());

        // Header arrives one byte at a time.
        frame.unfilled()[0] = wire[0];
        frame.mark_received(1);
        assert!(frame.pending_header());
        frame.unfilled()[0] = wire[1];
        frame.mark_received(1);
        assert!(!frame.pending_header());

        let size = frame.parse_declared_size().unwrap();
        assert_eq!(size, wire.len());
        assert!(frame.body_started());
        assert!(!frame.is_complete());

        let n = frame.unfilled().len();
        frame.unfilled().copy_from_slice(&wire[2..]);
        frame.mark_received(n);
        assert!(frame.is_complete());

        frame.prepare_to_read();
        assert_eq!(frame.frame_type(), 9);
        assert_eq!(frame.read_u16().unwrap(), 0x1234);
    }

    #[test]
    fn declared_size_below_minimum_rejected() {
        let mut frame = Frame::for_receive(DEFAULT_MAX_FRAME);
        frame.unfilled().copy_from_slice(&2u16.to_le_bytes());
        frame.mark_received(2);

        let err = frame.parse_declared_size().unwrap_err();
        assert!(matches!(err, FrameError::InvalidSize { size: 2, .. }));
    }

    #[test]
    fn declared_size_above_limit_rejected() {
        let mut frame = Frame::for_receive(16);
        frame.unfilled().copy_from_slice(&17u16.to_le_bytes());
        frame.mark_received(2);

        let err = frame.parse_declared_size().unwrap_err();
        assert!(matches!(err, FrameError::InvalidSize { size: 17, max: 16, .. }));
    }

    #[test]
    fn declared_size_at_bounds_accepted() {
        for size in [MIN_FRAME_SIZE as u16, 16u16] {
            let mut frame = Frame::for_receive(16);
            frame.unfilled().copy_from_slice(&size.to_le_bytes());
            frame.mark_received(2);
            assert_eq!(frame.parse_declared_size().unwrap(), size as usize);
        }
    }
}
