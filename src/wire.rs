//! Wire-format encoding for telemetry uploads.
//!
//! Every upload is a single request: a block of `Key: value` text lines,
//! each terminated by CR LF, a blank CR LF line, then the frame payload
//! padded to its canonical length. This module is responsible for:
//! - Padding the payload to the full frame size the servers expect
//!   (zeroed trailing Reed-Solomon parity bytes).
//! - Building the header lines in the fixed order the servers require.
//! - Encoding the header one byte per character (Latin-1).
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Request layout
//!
//! ```text
//! Sequence: <decimal sequence number>\r\n
//! Source: <satellite prefix><.duv|.bpsk|.highspeed>\r\n
//! Length: <canonical payload length in bits>\r\n
//! Date: <Www, dd Mon yyyy HH:mm:ss, UTC>\r\n
//! Receiver: <callsign or NONE>\r\n
//! Rx-Location: <N|S> <abs lat> <E|W> <abs lon> 0\r\n
//! Demodulator: <client id>\r\n
//! \r\n
//! <canonical payload bytes>
//! ```
//!
//! There is no checksum or length prefix beyond the `Length:` field; the
//! connection boundary frames the message.

use crate::frame::{Frame, UplinkError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed client identification sent in the `Demodulator:` header.
pub const CLIENT_ID: &str = "amsat-uplink/0.1.0 (rust)";

/// Map a raw payload length to the canonical on-wire length.
///
/// Raw lengths are frames without parity; canonical lengths include the
/// parity bytes the servers expect. Already-canonical lengths map to
/// themselves.
fn canonical_length(len: usize) -> Option<usize> {
    match len {
        64 | 96 => Some(96),
        476 | 572 => Some(572),
        4600 | 5272 => Some(5272),
        _ => None,
    }
}

/// `Source:` suffix for a canonical payload length.
fn source_suffix(canonical: usize) -> Option<&'static str> {
    match canonical {
        96 => Some(".duv"),
        572 => Some(".bpsk"),
        5272 => Some(".highspeed"),
        _ => None,
    }
}

/// Pad `payload` to its canonical length with zeroed trailing parity bytes.
///
/// The original bytes are preserved unchanged at the front. Lengths outside
/// the recognized set are a caller error, reported before any I/O.
pub fn normalize_payload(payload: &[u8]) -> Result<Vec<u8>, UplinkError> {
    let canonical = canonical_length(payload.len())
        .ok_or(UplinkError::InvalidFrameSize(payload.len()))?;
    let mut data = payload.to_vec();
    data.resize(canonical, 0);
    Ok(data)
}

/// Encode `frame` into the complete transmit buffer (header + padded payload).
///
/// Fails with [`UplinkError::InvalidFrameSize`] if the payload length is not
/// one of the recognized frame sizes. The caller's frame is not modified.
pub fn encode(frame: &Frame) -> Result<Vec<u8>, UplinkError> {
    let data = normalize_payload(&frame.payload)?;
    let suffix =
        source_suffix(data.len()).ok_or(UplinkError::InvalidFrameSize(frame.payload.len()))?;

    let mut header = String::new();
    header.push_str(&format!("Sequence: {}\r\n", frame.sequence));
    header.push_str(&format!(
        "Source: {}{}\r\n",
        frame.satellite.source_prefix(),
        suffix
    ));
    header.push_str(&format!("Length: {}\r\n", data.len() * 8));
    header.push_str(&format!("Date: {}\r\n", format_date(frame.time)));
    header.push_str(&format!("Receiver: {}\r\n", format_callsign(&frame.callsign)));
    header.push_str(&format!(
        "Rx-Location: {} {} 0\r\n",
        format_latitude(frame.latitude),
        format_longitude(frame.longitude)
    ));
    header.push_str(&format!("Demodulator: {}\r\n", CLIENT_ID));
    header.push_str("\r\n");

    let mut out = latin1_bytes(&header);
    out.extend_from_slice(&data);
    Ok(out)
}

/// Encode header text one byte per character (Latin-1).
///
/// Characters above U+00FF cannot be represented and degrade to `?`.
fn latin1_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect()
}

fn format_callsign(callsign: &str) -> &str {
    if callsign.trim().is_empty() {
        "NONE"
    } else {
        callsign
    }
}

// {:?} keeps a trailing .0 on integral coordinates, so the value always
// reads as a float on the server side.

fn format_latitude(f: f64) -> String {
    if f >= 0.0 {
        format!("N {:?}", f)
    } else {
        format!("S {:?}", f.abs())
    }
}

fn format_longitude(f: f64) -> String {
    if f >= 0.0 {
        format!("E {:?}", f)
    } else {
        format!("W {:?}", f.abs())
    }
}

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Format a timestamp as `Www, dd Mon yyyy HH:mm:ss` in UTC, English names,
/// no timezone suffix. Sub-second precision is truncated.
///
/// Pre-epoch timestamps clamp to the epoch.
fn format_date(time: SystemTime) -> String {
    let secs = time
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let days = secs / 86_400;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days as i64);
    // 1970-01-01 was a Thursday.
    let weekday = WEEKDAYS[((days + 4) % 7) as usize];
    format!(
        "{}, {:02} {} {} {:02}:{:02}:{:02}",
        weekday,
        day,
        MONTHS[month - 1],
        year,
        rem / 3_600,
        rem % 3_600 / 60,
        rem % 60
    )
}

/// Convert days since 1970-01-01 to a (year, month, day) civil date
/// (proleptic Gregorian calendar, Howard Hinnant's algorithm).
fn civil_from_days(z: i64) -> (i64, usize, i64) {
    let z = z + 719_468;
    let shifted = if z >= 0 { z } else { z - 146_096 };
    let era = shifted / 146_097;
    let doe = z - era * 146_097; // [0, 146096]
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11]
    let day = doy - (153 * mp + 2) / 5 + 1; // [1, 31]
    let month = if mp < 10 { mp + 3 } else { mp - 9 }; // [1, 12]
    (if month <= 2 { y + 1 } else { y }, month as usize, day)
}
