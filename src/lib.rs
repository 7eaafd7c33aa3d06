//! `amsat-uplink` — upload decoded satellite telemetry frames to the AMSAT
//! telemetry aggregation servers.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────┐  Frame   ┌──────────────┐
//!  │   caller /   │─────────▶│ UplinkClient │  encode once, then try
//!  │  demodulator │          └──────┬───────┘  servers in configured order
//!  └──────────────┘                 │
//!                     header+payload│bytes
//!               ┌───────────────────┼───────────────────┐
//!               ▼                   ▼                   ▼
//!      ┌────────────────┐  ┌────────────────┐  ┌────────────────┐
//!      │ServerConnection│  │ServerConnection│  │ServerConnection│
//!      │  (primary)     │  │  (fallback 1)  │  │  (fallback N)  │
//!      └────────────────┘  └────────────────┘  └────────────────┘
//!        one TCP connect-write-read-close exchange per attempt
//! ```
//!
//! Each module has a single responsibility:
//! - [`frame`]      — telemetry frame model, satellite identities, error type
//! - [`wire`]       — wire format (text header + zero-padded binary payload)
//! - [`connection`] — one blocking exchange against one server
//! - [`response`]   — 4-byte acknowledgment classification
//! - [`client`]     — encode-once, multi-server failover orchestration
//!
//! The whole crate is synchronous: a [`client::UplinkClient::send`] call
//! blocks until a server accepts the frame or every configured server has
//! been tried. Connections are never reused — the servers close after each
//! acknowledgment, so every exchange opens a fresh socket.

pub mod client;
pub mod connection;
pub mod frame;
pub mod response;
pub mod wire;

pub use client::UplinkClient;
pub use connection::ServerConnection;
pub use frame::{Frame, Satellite, UplinkError};
pub use wire::encode;
