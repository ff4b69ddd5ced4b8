//! UDP datagram transport.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::error::{StartupError, TransportError};
use crate::ports::{RecvFuture, RequestSource};

/// Datagram sent to the peer once the bridge is ready for requests.
pub const READY_MESSAGE: &str = "Ready";

/// A bound UDP socket yielding one datagram per request.
#[derive(Debug)]
pub struct UdpTransport {
    socket: Option<UdpSocket>,
    buffer: Vec<u8>,
}

impl UdpTransport {
    /// Bind on all interfaces at `port` (0 picks a free port).
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound.
    pub async fn bind(port: u16, recv_buffer: usize) -> Result<Self, StartupError> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map_err(|source| StartupError::Bind { port, source })?;
        info!(port, "listening for requests");
        Ok(Self {
            socket: Some(socket),
            buffer: vec![0; recv_buffer],
        })
    }

    /// Local address of the socket, if still open.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Whether the socket is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Send a text message to `peer`.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is closed or the send fails.
    pub async fn send_to(&self, message: &str, peer: SocketAddr) -> Result<(), TransportError> {
        let closed = || std::io::Error::new(std::io::ErrorKind::NotConnected, "socket closed");
        let socket = self.socket.as_ref().ok_or_else(closed)?;
        socket.send_to(message.as_bytes(), peer).await?;
        Ok(())
    }
}

impl RequestSource for UdpTransport {
    fn recv(&mut self) -> RecvFuture<'_> {
        Box::pin(async move {
            let Some(socket) = self.socket.as_ref() else {
                return Ok(None);
            };
            let (n, from) = socket.recv_from(&mut self.buffer).await?;
            debug!(%from, bytes = n, "datagram");
            Ok(Some(self.buffer[..n].to_vec()))
        })
    }

    fn close(&mut self) {
        if self.socket.take().is_some() {
            info!("socket closed");
        }
    }
}
