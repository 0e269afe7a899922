//! Per-connection transport state machine.
//!
//! A [`Connection`] owns one non-blocking stream, an outbound FIFO of
//! finalized frames, and at most one in-progress inbound frame. It is driven
//! by an external poll loop: [`Connection::flush`] on writability,
//! [`Connection::try_receive`] on readability. No call blocks; partial
//! transfers resume exactly where they left off on the next turn.

use std::collections::VecDeque;

use framelink_frame::{Frame, FrameError, DEFAULT_MAX_FRAME};
use tracing::{debug, trace, warn};

use crate::error::{CloseCause, Disconnect};
use crate::stream::{IoOutcome, WireStream};

/// Which side of the connection this endpoint is.
///
/// The wire format is identical on both sides; the role only decides the
/// teardown consequences (see [`Disconnect::is_session_fatal`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The connection-initiating peer (e.g. a client).
    Active,
    /// The connection-accepting peer (e.g. one server-side socket).
    Passive,
}

/// Per-connection transport configuration.
#[derive(Debug, Clone)]
pub struct ConnConfig {
    /// Maximum total frame size in bytes, header included. Applies to both
    /// outbound frames created via [`Connection::build_frame`] and the
    /// declared size of inbound frames.
    pub max_frame_size: usize,
}

impl Default for ConnConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}

/// One frame-stream connection over a non-blocking duplex byte stream.
pub struct Connection<S> {
    /// Released exactly once, on teardown.
    stream: Option<S>,
    role: Role,
    config: ConnConfig,
    outbound: VecDeque<Frame>,
    /// Bytes of the front outbound frame already accepted by the stream.
    sent: usize,
    inbound: Option<Frame>,
    /// Cleared when a send would block, re-derived by the scheduler via
    /// [`Connection::set_writable`]; lets flush skip redundant attempts.
    writable: bool,
    closed: bool,
}

impl<S: WireStream> Connection<S> {
    /// Wrap a connected, non-blocking stream with default configuration.
    pub fn new(stream: S, role: Role) -> Self {
        Self::with_config(stream, role, ConnConfig::default())
    }

    /// Wrap a connected, non-blocking stream with explicit configuration.
    pub fn with_config(stream: S, role: Role, config: ConnConfig) -> Self {
        Self {
            stream: Some(stream),
            role,
            config,
            outbound: VecDeque::new(),
            sent: 0,
            inbound: None,
            writable: true,
            closed: false,
        }
    }

    /// Begin building an outbound frame sized to this connection's limit.
    pub fn build_frame(&self, frame_type: u8) -> Frame {
        Frame::build_with_limit(frame_type, self.config.max_frame_size)
    }

    /// Finalize a builder-phase frame and append it to the outbound queue.
    ///
    /// This is the ownership hand-off point: once enqueued the frame belongs
    /// to the connection until it is fully transmitted or the connection is
    /// torn down. It goes out on a following [`Connection::flush`] pass, in
    /// strict FIFO order. Discarded without effect on a closed connection.
    pub fn enqueue(&mut self, mut frame: Frame) {
        if self.closed {
            trace!("enqueue on closed connection discarded");
            return;
        }
        frame.finalize();
        self.outbound.push_back(frame);
    }

    /// Send as much queued data as the stream will take right now.
    ///
    /// Invoked by the scheduler whenever the stream is writable. Stops when
    /// the queue is empty, the stream would block, or a write was partial
    /// (the OS buffer is momentarily full). Never retransmits or skips a
    /// byte: the send cursor of the front frame survives across passes.
    ///
    /// A hard failure or orderly peer shutdown tears the connection down
    /// and surfaces as a [`Disconnect`]. No-op once closed.
    pub fn flush(&mut self) -> Result<(), Disconnect> {
        if self.closed || !self.writable {
            return Ok(());
        }

        loop {
            let outcome = {
                let Some(front) = self.outbound.front() else {
                    return Ok(());
                };
                let pending = &front.as_wire()[self.sent..];
                let Some(stream) = self.stream.as_mut() else {
                    return Ok(());
                };
                stream.try_write(pending)
            };

            match outcome {
                Ok(IoOutcome::Transferred(n)) => {
                    self.sent += n;
                    let total = self.outbound.front().map_or(0, Frame::len);
                    if self.sent == total {
                        trace!(len = total, "frame fully transmitted");
                        self.outbound.pop_front();
                        self.sent = 0;
                    } else {
                        // Partial write: the stream is momentarily full.
                        // Keep our position and end the pass.
                        return Ok(());
                    }
                }
                Ok(IoOutcome::WouldBlock) => {
                    self.writable = false;
                    return Ok(());
                }
                Ok(IoOutcome::PeerClosed) => {
                    return Err(self.tear_down(CloseCause::PeerClosed));
                }
                Err(err) => return Err(self.tear_down(CloseCause::Io(err))),
            }
        }
    }

    /// Drive the inbound state machine; returns a completed frame if one
    /// finished assembling on this turn.
    ///
    /// Invoked by the scheduler whenever the stream is readable. Assembly is
    /// two-phase: first the 2-byte size prefix, then the declared body. A
    /// declared size outside `[3, max_frame_size]` means the stream is no
    /// longer frame-aligned and always tears the connection down.
    ///
    /// `Ok(None)` means no complete frame yet; the partial byte count lives
    /// on the in-progress frame and the next call resumes exactly there.
    /// Yields `None` once closed.
    pub fn try_receive(&mut self) -> Result<Option<Frame>, Disconnect> {
        if self.closed {
            return Ok(None);
        }

        let mut frame = match self.inbound.take() {
            Some(frame) => frame,
            None => Frame::for_receive(self.config.max_frame_size),
        };

        // Phase A: the size prefix. The buffer is sized to exactly the
        // prefix so we never pull in bytes of the next frame early.
        while frame.pending_header() {
            match self.read_into(&mut frame) {
                Ok(IoOutcome::Transferred(n)) => frame.mark_received(n),
                Ok(IoOutcome::WouldBlock) => {
                    self.inbound = Some(frame);
                    return Ok(None);
                }
                Ok(IoOutcome::PeerClosed) => {
                    return Err(self.tear_down(CloseCause::PeerClosed));
                }
                Err(err) => return Err(self.tear_down(CloseCause::Io(err))),
            }
        }

        if !frame.body_started() {
            if let Err(FrameError::InvalidSize { size, min, max }) = frame.parse_declared_size() {
                return Err(self.tear_down(CloseCause::ProtocolViolation { size, min, max }));
            }
        }

        // Phase B: the body, up to the declared size.
        while !frame.is_complete() {
            match self.read_into(&mut frame) {
                Ok(IoOutcome::Transferred(n)) => frame.mark_received(n),
                Ok(IoOutcome::WouldBlock) => {
                    self.inbound = Some(frame);
                    return Ok(None);
                }
                Ok(IoOutcome::PeerClosed) => {
                    return Err(self.tear_down(CloseCause::PeerClosed));
                }
                Err(err) => return Err(self.tear_down(CloseCause::Io(err))),
            }
        }

        frame.prepare_to_read();
        trace!(
            frame_type = frame.frame_type(),
            len = frame.len(),
            "received frame"
        );
        Ok(Some(frame))
    }

    fn read_into(&mut self, frame: &mut Frame) -> std::io::Result<IoOutcome> {
        match self.stream.as_mut() {
            Some(stream) => stream.try_read(frame.unfilled()),
            // Unreachable while the connection is open; treated as inert.
            None => Ok(IoOutcome::WouldBlock),
        }
    }

    /// Mark the stream as (not) accepting more bytes.
    ///
    /// The scheduler re-derives this each turn from its poll results; flush
    /// clears it on its own when a send would block.
    pub fn set_writable(&mut self, writable: bool) {
        if !self.closed {
            self.writable = writable;
        }
    }

    /// Explicitly close the connection, discarding all not-yet-sent
    /// outbound frames and any in-progress inbound frame.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        debug!(
            role = ?self.role,
            discarded = self.outbound.len(),
            "closing connection"
        );
        self.release();
    }

    fn tear_down(&mut self, cause: CloseCause) -> Disconnect {
        match &cause {
            CloseCause::PeerClosed => debug!(role = ?self.role, "peer closed connection"),
            CloseCause::ProtocolViolation { size, min, max } => warn!(
                role = ?self.role,
                size, min, max, "protocol violation; closing connection"
            ),
            CloseCause::Io(err) => {
                warn!(role = ?self.role, error = %err, "connection I/O failure")
            }
        }
        self.release();
        Disconnect {
            role: self.role,
            cause,
        }
    }

    /// Release the stream, then the queued outbound frames, then the
    /// inbound partial, in that order, exactly once.
    fn release(&mut self) {
        self.stream = None;
        self.outbound.clear();
        self.sent = 0;
        self.inbound = None;
        self.writable = false;
        self.closed = true;
    }

    /// Whether the connection has been torn down. Latched: a closed
    /// connection never performs I/O again.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Which side of the connection this endpoint is.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Number of frames waiting in the outbound queue. The front frame may
    /// be partially transmitted.
    pub fn queue_len(&self) -> usize {
        self.outbound.len()
    }

    /// Whether there is anything left to send; schedulers poll writability
    /// only while this holds.
    pub fn has_pending_output(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Borrow the underlying stream, e.g. to register it with a poller.
    /// `None` once the connection is closed.
    pub fn get_ref(&self) -> Option<&S> {
        self.stream.as_ref()
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("role", &self.role)
            .field("closed", &self.closed)
            .field("writable", &self.writable)
            .field("outbound", &self.outbound.len())
            .field("inbound_partial", &self.inbound.is_some())
            .finish()
    }
}
