//! TCP endpoints for the frame transport.
//!
//! Thin bind/accept/connect helpers that hand out [`Connection`]s over
//! non-blocking `TcpStream`s with the role fixed at creation: accepted
//! sockets are passive, initiated ones active.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::conn::{ConnConfig, Connection, Role};
use crate::error::{Result, TransportError};

/// A non-blocking TCP listener producing passive-side connections.
#[derive(Debug)]
pub struct FrameListener {
    listener: TcpListener,
    addr: SocketAddr,
    config: ConnConfig,
}

impl FrameListener {
    /// Bind and listen on the given address with default configuration.
    pub fn bind(addr: SocketAddr) -> Result<Self> {
        Self::bind_with_config(addr, ConnConfig::default())
    }

    /// Bind and listen with explicit per-connection configuration.
    pub fn bind_with_config(addr: SocketAddr, config: ConnConfig) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| TransportError::Bind {
            addr,
            source,
        })?;
        listener
            .set_nonblocking(true)
            .map_err(|source| TransportError::Bind { addr, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| TransportError::Bind { addr, source })?;

        info!(%addr, "listening for frame connections");

        Ok(Self {
            listener,
            addr,
            config,
        })
    }

    /// Accept one pending connection, if any.
    ///
    /// Non-blocking: `Ok(None)` when no connection is waiting.
    pub fn accept(&self) -> Result<Option<Connection<TcpStream>>> {
        match self.listener.accept() {
            Ok((stream, peer)) => {
                prepare_stream(&stream).map_err(TransportError::Accept)?;
                debug!(%peer, "accepted frame connection");
                Ok(Some(Connection::with_config(
                    stream,
                    Role::Passive,
                    self.config.clone(),
                )))
            }
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }
}

/// Connect to a listening peer, producing an active-side connection.
pub fn connect(addr: SocketAddr) -> Result<Connection<TcpStream>> {
    connect_with_config(addr, ConnConfig::default())
}

/// Connect with explicit per-connection configuration.
pub fn connect_with_config(addr: SocketAddr, config: ConnConfig) -> Result<Connection<TcpStream>> {
    let stream =
        TcpStream::connect(addr).map_err(|source| TransportError::Connect { addr, source })?;
    prepare_stream(&stream)?;

    debug!(%addr, "connected to frame listener");

    Ok(Connection::with_config(stream, Role::Active, config))
}

fn prepare_stream(stream: &TcpStream) -> io::Result<()> {
    stream.set_nonblocking(true)?;
    // Frames are small and latency-sensitive; don't let the OS coalesce.
    stream.set_nodelay(true)?;
    Ok(())
}
