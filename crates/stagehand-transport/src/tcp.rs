//! TCP transport built on `tokio::net::TcpListener`.

use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream};

use crate::{Accepted, Transport, TransportError};

/// A [`Transport`] that accepts plain TCP connections.
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    /// Binds a listener to the given address (`"host:port"`).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await.map_err(TransportError::Bind)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self { listener })
    }

    /// Returns the address the listener is bound to.
    ///
    /// Useful after binding to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::LocalAddr)
    }
}

impl Transport for TcpTransport {
    type Stream = TcpStream;

    async fn accept(&mut self) -> Result<Accepted<TcpStream>, TransportError> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Frames are tiny and latency-bound.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%peer, error = %e, "could not disable Nagle");
        }

        tracing::debug!(%peer, "accepted TCP connection");
        Ok(Accepted { stream, peer })
    }
}
