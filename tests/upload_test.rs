//! End-to-end tests against an in-process mock telemetry server.
//!
//! Unit tests for encoding, response classification and the failover
//! preconditions live next to the code in `src/`. The tests here exercise
//! the full client over real loopback TCP: one mock server per configured
//! target, each accepting a single connection, capturing the complete
//! request (headers + body) and answering with a configurable reply.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, UNIX_EPOCH};

use amsat_uplink::wire::CLIENT_ID;
use amsat_uplink::{Frame, Satellite, UplinkClient, UplinkError};

const OK: [u8; 4] = [0x4F, 0x4D, 0x0D, 0x0A];
const FAIL: [u8; 4] = [0x46, 0x41, 0x0D, 0x0A];

/// What the mock server does after reading a full request.
enum Reply {
    /// Write these bytes, then close.
    Bytes(Vec<u8>),
    /// Hold the connection open without answering, then close.
    Silence(Duration),
}

/// Spawn a mock telemetry server that accepts one connection, captures the
/// full request and acts out `reply`. Returns the server address and the
/// channel the captured request arrives on.
fn mock_server(reply: Reply) -> (SocketAddr, Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        match reply {
            Reply::Bytes(bytes) => {
                stream.write_all(&bytes).unwrap();
                stream.flush().unwrap();
            }
            Reply::Silence(duration) => thread::sleep(duration),
        }
        // The test may have finished with the receiver already dropped.
        let _ = tx.send(request);
    });
    (addr, rx)
}

/// Read one full request: header lines up to the blank CR LF line, then as
/// many body bytes as the `Length:` header announces (in bits).
fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut byte = [0u8; 1];
    while !request.ends_with(b"\r\n\r\n") {
        stream.read_exact(&mut byte).unwrap();
        request.push(byte[0]);
    }
    let headers = String::from_utf8_lossy(&request).to_string();
    let bits: usize = headers
        .lines()
        .find_map(|line| line.strip_prefix("Length: "))
        .expect("Length header")
        .trim()
        .parse()
        .expect("numeric Length");
    let mut body = vec![0u8; bits / 8];
    stream.read_exact(&mut body).unwrap();
    request.extend_from_slice(&body);
    request
}

/// An address with nothing listening on it: bind an OS-assigned port, then
/// release it before anyone connects.
fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn valid_frame() -> Frame {
    Frame {
        sequence: 2,
        satellite: Satellite::Fox1Cliff,
        time: UNIX_EPOCH + Duration::from_millis(1_589_963_102_295),
        callsign: "M7RED".to_string(),
        latitude: 53.72,
        longitude: 47.57,
        payload: vec![0u8; 64],
    }
}

fn client_for(addresses: Vec<SocketAddr>) -> UplinkClient {
    UplinkClient::new(addresses, Duration::from_millis(2_000))
}

#[test]
fn success_sends_exact_request_bytes() {
    let (addr, rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![addr]);

    client.send(&valid_frame()).unwrap();

    let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let expected_header = format!(
        "Sequence: 2\r\n\
         Source: amsat.fox-1c.ihu.duv\r\n\
         Length: 768\r\n\
         Date: Wed, 20 May 2020 08:25:02\r\n\
         Receiver: M7RED\r\n\
         Rx-Location: N 53.72 E 47.57 0\r\n\
         Demodulator: {}\r\n\
         \r\n",
        CLIENT_ID
    );
    let mut expected = expected_header.into_bytes();
    expected.extend_from_slice(&[0u8; 96]);
    assert_eq!(request, expected);
}

#[test]
fn payload_prefix_survives_padding_on_the_wire() {
    let (addr, rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![addr]);

    let mut frame = valid_frame();
    frame.payload = (0u8..64).collect();
    client.send(&frame).unwrap();

    let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let body = &request[request.len() - 96..];
    assert_eq!(&body[..64], &frame.payload[..]);
    assert!(body[64..].iter().all(|&b| b == 0));
}

#[test]
fn explicit_failure_token_is_a_rejection() {
    let (addr, _rx) = mock_server(Reply::Bytes(FAIL.to_vec()));
    let mut client = client_for(vec![addr]);

    assert_eq!(client.send(&valid_frame()), Err(UplinkError::Rejected));
}

#[test]
fn unknown_reply_carries_the_received_bytes() {
    let (addr, _rx) = mock_server(Reply::Bytes(vec![0xCA, 0xFE, 0xCA, 0xFE]));
    let mut client = client_for(vec![addr]);

    assert_eq!(
        client.send(&valid_frame()),
        Err(UplinkError::UnknownResponse([0xCA, 0xFE, 0xCA, 0xFE]))
    );
}

#[test]
fn short_reply_is_a_transport_error() {
    let (addr, _rx) = mock_server(Reply::Bytes(vec![0x4F, 0x4D]));
    let mut client = client_for(vec![addr]);

    match client.send(&valid_frame()) {
        Err(UplinkError::Network(_)) => {}
        other => panic!("expected Network error, got {:?}", other),
    }
}

#[test]
fn silent_server_times_out() {
    let (addr, _rx) = mock_server(Reply::Silence(Duration::from_secs(3)));
    let mut client = UplinkClient::new(vec![addr], Duration::from_millis(300));

    assert_eq!(client.send(&valid_frame()), Err(UplinkError::Timeout));
}

#[test]
fn failover_past_refused_connections() {
    let dead_first = refused_addr();
    let dead_second = refused_addr();
    let (live, rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![dead_first, dead_second, live]);

    client.send(&valid_frame()).unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn failover_past_a_rejecting_server() {
    // Protocol failures fail over exactly like transport errors.
    let (rejecting, reject_rx) = mock_server(Reply::Bytes(FAIL.to_vec()));
    let (accepting, accept_rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![rejecting, accepting]);

    client.send(&valid_frame()).unwrap();

    // Both servers saw the identical request bytes.
    let first = reject_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    let second = accept_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn first_success_stops_the_failover_loop() {
    let (primary, _primary_rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let (fallback, fallback_rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![primary, fallback]);

    client.send(&valid_frame()).unwrap();

    assert!(
        fallback_rx.recv_timeout(Duration::from_millis(300)).is_err(),
        "fallback server must not be contacted after the primary accepted"
    );
}

#[test]
fn last_error_wins_when_all_servers_fail() {
    let (unknown, _rx1) = mock_server(Reply::Bytes(vec![0xCA, 0xFE, 0xCA, 0xFE]));
    let (rejecting, _rx2) = mock_server(Reply::Bytes(FAIL.to_vec()));
    let mut client = client_for(vec![unknown, rejecting]);

    // The unrecognized response from the first server is discarded; the
    // rejection from the last server attempted is what surfaces.
    assert_eq!(client.send(&valid_frame()), Err(UplinkError::Rejected));
}

#[test]
fn invalid_frame_size_contacts_no_server() {
    let (addr, rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![addr]);

    let mut frame = valid_frame();
    frame.payload = vec![0xCA, 0xFE];
    assert_eq!(client.send(&frame), Err(UplinkError::InvalidFrameSize(2)));

    // The mock never got a request.
    assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());

    // The same client still works for a valid frame afterwards.
    client.send(&valid_frame()).unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
}

#[test]
fn sequential_sends_reuse_the_client() {
    // Connections are one-per-exchange; a second send opens a fresh one.
    let (first, rx1) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![first]);
    client.send(&valid_frame()).unwrap();
    rx1.recv_timeout(Duration::from_secs(5)).unwrap();

    // The first mock only serves one connection, so the retry falls over to
    // a transport error, proving the client did not hold the old socket.
    match client.send(&valid_frame()) {
        Err(UplinkError::Network(_)) | Err(UplinkError::Timeout) => {}
        other => panic!("expected transport error on exhausted mock, got {:?}", other),
    }
}

#[test]
fn stop_with_no_upload_in_progress_is_safe() {
    let (addr, _rx) = mock_server(Reply::Bytes(OK.to_vec()));
    let mut client = client_for(vec![addr]);
    client.stop();
    client.send(&valid_frame()).unwrap();
    client.stop();
    client.stop();
}
