use std::io;
use std::net::SocketAddr;

use crate::conn::Role;

/// Errors that can occur while setting up transport endpoints.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    /// Failed to connect to the specified address.
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: SocketAddr, source: io::Error },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(io::Error),

    /// An I/O error occurred on the transport socket.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// A connection has been torn down; carries which side this was and why.
///
/// By the time a `Disconnect` is returned the connection has already
/// released its socket and freed every queued frame. The same failure means
/// different things depending on the side: a server tearing down one
/// misbehaving peer keeps serving the others, while a client losing its only
/// connection has lost the whole session.
#[derive(Debug, thiserror::Error)]
#[error("{cause}")]
pub struct Disconnect {
    pub role: Role,
    pub cause: CloseCause,
}

impl Disconnect {
    /// True when losing this connection ends the whole session.
    ///
    /// The active (connecting) side has no other connection to fall back to
    /// and is expected to transition to a disconnected state. The passive
    /// (accepting) side treats the event as local and recoverable.
    pub fn is_session_fatal(&self) -> bool {
        self.role == Role::Active
    }
}

/// Why a connection was torn down.
#[derive(Debug, thiserror::Error)]
pub enum CloseCause {
    /// An inbound frame declared a size outside the valid range. The stream
    /// can no longer be trusted to be frame-aligned.
    #[error("declared frame size {size} outside [{min}, {max}]")]
    ProtocolViolation { size: usize, min: usize, max: usize },

    /// The peer shut the stream down in an orderly fashion.
    #[error("peer closed the connection")]
    PeerClosed,

    /// An unrecoverable read or write error.
    #[error("connection I/O failure: {0}")]
    Io(#[source] io::Error),
}
