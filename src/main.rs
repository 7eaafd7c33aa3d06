//! Entry point for `amsat-uplink`.
//!
//! Parses CLI arguments, reads the raw frame payload from a file and uploads
//! a single telemetry frame stamped with the current time. All protocol work
//! is delegated to library modules; `main.rs` owns only process setup
//! (logging, argument parsing, address resolution).

use amsat_uplink::{Frame, Satellite, UplinkClient};
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// Upload one decoded satellite telemetry frame to the AMSAT servers.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Telemetry server as host:port; repeat to add failover targets,
    /// tried in the order given.
    #[arg(short, long, required = true)]
    server: Vec<String>,

    /// Satellite the frame was received from (e.g. fox1d, huskysat1).
    #[arg(long)]
    satellite: Satellite,

    /// Frame sequence number.
    #[arg(long)]
    sequence: u64,

    /// Receiving station callsign; omit if unknown.
    #[arg(long, default_value = "")]
    callsign: String,

    /// Receiver latitude in degrees (negative = south).
    #[arg(long)]
    latitude: f64,

    /// Receiver longitude in degrees (negative = west).
    #[arg(long)]
    longitude: f64,

    /// Connect/read timeout per server, in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// File containing the raw frame payload bytes.
    payload: PathBuf,
}

fn main() -> Result<()> {
    // Initialise env_logger; set RUST_LOG to control verbosity.
    env_logger::init();

    let cli = Cli::parse();

    let mut addresses: Vec<SocketAddr> = Vec::new();
    for server in &cli.server {
        let addr = server
            .to_socket_addrs()
            .with_context(|| format!("unable to resolve {}", server))?
            .next();
        match addr {
            Some(addr) => addresses.push(addr),
            None => bail!("no address for {}", server),
        }
    }

    let payload = std::fs::read(&cli.payload)
        .with_context(|| format!("unable to read {}", cli.payload.display()))?;

    let frame = Frame {
        sequence: cli.sequence,
        satellite: cli.satellite,
        time: SystemTime::now(),
        callsign: cli.callsign,
        latitude: cli.latitude,
        longitude: cli.longitude,
        payload,
    };

    let mut client = UplinkClient::new(addresses, Duration::from_millis(cli.timeout_ms));
    let result = client.send(&frame);
    client.stop();
    result.with_context(|| format!("unable to upload frame {}", frame.sequence))?;

    println!("frame {} accepted", frame.sequence);
    Ok(())
}
