//! One blocking exchange against one telemetry server.
//!
//! A [`ServerConnection`] owns the socket state for a single configured
//! target. The servers accept exactly one request per connection and close
//! afterwards, so the lifecycle is deliberately short: connect lazily on
//! use, write the request, read the fixed 4-byte acknowledgment, close.
//! The socket is torn down on every exit path — a later exchange never
//! observes a half-used connection.

use crate::frame::UplinkError;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// A single telemetry server target: address, timeout, and (between the
/// connect and the teardown inside one exchange) the open socket.
pub struct ServerConnection {
    address: SocketAddr,
    timeout: Duration,
    socket: Option<TcpStream>,
}

impl ServerConnection {
    /// Create a disconnected target. No I/O happens until [`Self::exchange`].
    pub fn new(address: SocketAddr, timeout: Duration) -> Self {
        Self {
            address,
            timeout,
            socket: None,
        }
    }

    /// Address of this target.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Send `data` and read back the server's 4-byte acknowledgment.
    ///
    /// Connects lazily with the configured timeout, which also bounds the
    /// read and the write. The connection is closed before this returns,
    /// whether the exchange succeeded or not.
    pub fn exchange(&mut self, data: &[u8]) -> Result<[u8; 4], UplinkError> {
        if self.socket.is_none() {
            log::debug!("connecting to {}", self.address);
            let stream = TcpStream::connect_timeout(&self.address, self.timeout)?;
            stream.set_read_timeout(Some(self.timeout))?;
            stream.set_write_timeout(Some(self.timeout))?;
            self.socket = Some(stream);
        }
        let result = self.exchange_on_open_socket(data);
        // The servers support only one request per connection.
        self.stop();
        result
    }

    fn exchange_on_open_socket(&mut self, data: &[u8]) -> Result<[u8; 4], UplinkError> {
        let stream = self
            .socket
            .as_mut()
            .ok_or_else(|| UplinkError::Network("connection not established".to_string()))?;
        stream.write_all(data)?;
        stream.flush()?;
        let mut reply = [0u8; 4];
        // read_exact reports a premature close as UnexpectedEof.
        stream.read_exact(&mut reply)?;
        Ok(reply)
    }

    /// Drop any open socket. Safe to call at any time, any number of times.
    pub fn stop(&mut self) {
        if let Some(socket) = self.socket.take() {
            log::debug!("closing connection to {}", self.address);
            drop(socket);
        }
    }
}
