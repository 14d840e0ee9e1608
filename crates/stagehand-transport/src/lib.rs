//! Listener boundary for Stagehand.
//!
//! Provides the [`Transport`] trait that hands out raw byte streams, a TCP
//! implementation ([`TcpTransport`]), and the bounded accept task
//! ([`Acceptor`]) that feeds new streams to the tick loop.
//!
//! Address resolution, binding, and backlog tuning all stay behind
//! [`Transport`]; the layers above only see accepted streams.

mod acceptor;
mod error;
mod tcp;

pub use acceptor::Acceptor;
pub use error::TransportError;
pub use tcp::TcpTransport;

use std::future::Future;
use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncWrite};

/// A freshly accepted byte stream and the peer it came from.
#[derive(Debug)]
pub struct Accepted<S> {
    /// The raw stream. Ownership moves to the connection pump.
    pub stream: S,
    /// Remote address, for logging.
    pub peer: SocketAddr,
}

/// Accepts new incoming connections.
pub trait Transport: Send + 'static {
    /// The stream type produced by this transport.
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Waits for and accepts the next incoming connection.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Accepted<Self::Stream>, TransportError>> + Send;
}
