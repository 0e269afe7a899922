/// Errors that can occur while building or scanning a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A field write would push the frame past its size limit.
    ///
    /// This is a local contract violation, not a network condition; callers
    /// appending variable-length content should pre-check with
    /// [`crate::Frame::can_write`].
    #[error("write of {requested} bytes would exceed frame limit ({len} of {limit} used)")]
    CapacityExceeded {
        requested: usize,
        len: usize,
        limit: usize,
    },

    /// A field read requests more bytes than remain in the frame.
    ///
    /// Either the peer sent a malformed frame or a previous field was decoded
    /// with the wrong width.
    #[error("read of {requested} bytes but only {remaining} remain in frame")]
    Truncated { requested: usize, remaining: usize },

    /// The declared size of an inbound frame is outside the valid range.
    ///
    /// The stream can no longer be trusted to be frame-aligned.
    #[error("declared frame size {size} outside [{min}, {max}]")]
    InvalidSize { size: usize, min: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
