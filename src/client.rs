//! Upload client: encode once, fail over across servers in order.
//!
//! [`UplinkClient`] holds one [`ServerConnection`] per configured address.
//! A [`send`](UplinkClient::send) encodes the frame a single time and offers
//! the identical bytes to each server in configured order until one accepts.
//! Transport errors and protocol failures both move the loop to the next
//! server; an invalid frame aborts before any server is contacted.

use crate::connection::ServerConnection;
use crate::frame::{Frame, UplinkError};
use crate::{response, wire};
use std::net::SocketAddr;
use std::time::Duration;

/// Client for the AMSAT telemetry upload protocol.
///
/// `send` takes `&mut self`, so one client serves one upload at a time;
/// wrap it in a mutex if several threads share it.
pub struct UplinkClient {
    servers: Vec<ServerConnection>,
}

impl UplinkClient {
    /// Build a client for `addresses`, tried in the given order. `timeout`
    /// bounds connect, write and read against every server.
    pub fn new(addresses: Vec<SocketAddr>, timeout: Duration) -> Self {
        let servers = addresses
            .into_iter()
            .map(|address| ServerConnection::new(address, timeout))
            .collect();
        Self { servers }
    }

    /// Upload one frame.
    ///
    /// Returns `Ok(())` as soon as any server acknowledges the frame. If
    /// every server fails, the error from the *last* server attempted is
    /// returned; earlier errors are logged at `warn` and discarded. A
    /// payload with an unrecognized length fails with
    /// [`UplinkError::InvalidFrameSize`] before any connection is opened,
    /// and an empty server list with [`UplinkError::NoServers`].
    pub fn send(&mut self, frame: &Frame) -> Result<(), UplinkError> {
        let request = wire::encode(frame)?;
        let mut last_error = None;
        for server in &mut self.servers {
            match Self::send_one(server, &request) {
                Ok(()) => return Ok(()),
                Err(e) => {
                    log::warn!("upload to {} failed: {}", server.address(), e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or(UplinkError::NoServers))
    }

    /// One full exchange against one server: send, read 4 bytes, classify.
    fn send_one(server: &mut ServerConnection, request: &[u8]) -> Result<(), UplinkError> {
        let reply = server.exchange(request)?;
        response::interpret(&reply)
    }

    /// Release every server's connection. Idempotent; safe to call with no
    /// upload in progress.
    pub fn stop(&mut self) {
        for server in &mut self.servers {
            server.stop();
        }
    }
}
