//! Non-blocking frame transport over stream sockets.
//!
//! Turns an unreliable, partially-delivering byte stream into a sequence of
//! discrete, typed, length-bounded frames, and queued application frames
//! into wire bytes. Built for a single-threaded, cooperative model: an
//! external poll loop watches each connection's stream and calls
//! [`Connection::flush`] on writability and [`Connection::try_receive`] on
//! readability. Every call does a bounded amount of work and returns;
//! would-block is control flow, not an error.
//!
//! Ordering is strict FIFO per direction. Closing a connection at any time
//! discards unsent and half-received frames; the application only ever sees
//! complete frames.

pub mod conn;
pub mod error;
pub mod stream;
pub mod tcp;

pub use conn::{ConnConfig, Connection, Role};
pub use error::{CloseCause, Disconnect, Result, TransportError};
pub use stream::{IoOutcome, WireStream};
pub use tcp::{connect, connect_with_config, FrameListener};
