//! Telemetry frame model and crate-wide error type.
//!
//! A [`Frame`] is one unit of decoded telemetry handed to the client by the
//! demodulator. The client never mutates it; the encoder works on a padded
//! copy of the payload. [`Satellite`] is the closed set of identities the
//! telemetry servers accept, each with its fixed protocol source prefix.

use std::fmt;
use std::time::SystemTime;
use thiserror::Error;

/// Satellites known to the telemetry servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Satellite {
    Fox1A,
    Fox1B,
    Fox1Cliff,
    Fox1D,
    HuskySat1,
}

impl Satellite {
    /// Fixed `Source:` header prefix for this satellite.
    ///
    /// The on-wire suffix (`.duv` / `.bpsk` / `.highspeed`) is appended by
    /// the encoder based on the frame length.
    pub fn source_prefix(self) -> &'static str {
        match self {
            Satellite::Fox1A => "amsat.fox-1a.ihu",
            Satellite::Fox1B => "amsat.fox-1b.ihu",
            Satellite::Fox1Cliff => "amsat.fox-1c.ihu",
            Satellite::Fox1D => "amsat.fox-1d.ihu",
            Satellite::HuskySat1 => "amsat.husky_sat.ihu",
        }
    }
}

impl std::str::FromStr for Satellite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FOX1A" => Ok(Satellite::Fox1A),
            "FOX1B" => Ok(Satellite::Fox1B),
            "FOX1CLIFF" => Ok(Satellite::Fox1Cliff),
            "FOX1D" => Ok(Satellite::Fox1D),
            "HUSKYSAT1" => Ok(Satellite::HuskySat1),
            _ => Err(format!("Unknown satellite: {}", s)),
        }
    }
}

impl fmt::Display for Satellite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Satellite::Fox1A => write!(f, "FOX1A"),
            Satellite::Fox1B => write!(f, "FOX1B"),
            Satellite::Fox1Cliff => write!(f, "FOX1CLIFF"),
            Satellite::Fox1D => write!(f, "FOX1D"),
            Satellite::HuskySat1 => write!(f, "HUSKYSAT1"),
        }
    }
}

/// One decoded telemetry frame, ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Monotonic identifier chosen by the caller; not checked for uniqueness.
    pub sequence: u64,
    /// Satellite the frame was received from.
    pub satellite: Satellite,
    /// Receive timestamp (UTC instant).
    pub time: SystemTime,
    /// Receiving station callsign; empty or all-whitespace means none.
    pub callsign: String,
    /// Receiver latitude in degrees; negative is south.
    pub latitude: f64,
    /// Receiver longitude in degrees; negative is west.
    pub longitude: f64,
    /// Raw frame bytes. Length must be one of the recognized sizes
    /// (64, 96, 476, 572, 4600 or 5272 bytes).
    pub payload: Vec<u8>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UplinkError {
    /// Payload length is not one of the recognized frame sizes. Raised
    /// before any network activity; never triggers failover.
    #[error("unknown frame size: {0}")]
    InvalidFrameSize(usize),
    /// Connect, write or read failure against one server.
    #[error("network error: {0}")]
    Network(String),
    /// Connect or read deadline expired.
    #[error("timeout")]
    Timeout,
    /// Server answered with the explicit failure token.
    #[error("response: fail")]
    Rejected,
    /// Server answered with 4 bytes matching neither known token.
    #[error("unknown response: {0:02x?}")]
    UnknownResponse([u8; 4]),
    /// The client was configured with an empty server list.
    #[error("no servers configured")]
    NoServers,
}

impl From<std::io::Error> for UplinkError {
    fn from(err: std::io::Error) -> Self {
        // Read timeouts surface as WouldBlock on Unix and TimedOut on Windows.
        match err.kind() {
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => UplinkError::Timeout,
            _ => UplinkError::Network(err.to_string()),
        }
    }
}
