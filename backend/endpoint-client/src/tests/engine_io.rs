use crate::error::transport::TransportError;
use crate::transport::engine_io::{OpenHandshake, Packet};

use std::time::Duration;

/// **VALUE**: Verifies parsing of the server's open packet.
///
/// **WHY THIS MATTERS**: The transport is only considered open once this packet parses, and its
/// ping settings drive the liveness window. A parsing bug fails every connection.
///
/// **BUG THIS CATCHES**: Would catch camelCase field names not being mapped.
#[test]
fn given_open_frame_when_parsed_then_returns_handshake() {
    // GIVEN: A typical Engine.IO v4 open frame
    let frame = r#"0{"sid":"abc123","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;

    // WHEN: Parsing
    let packet = Packet::parse(frame).unwrap();

    // THEN: All fields are read
    match packet {
        Packet::Open(OpenHandshake {
            sid,
            ping_interval,
            ping_timeout,
            max_payload,
            ..
        }) => {
            assert_eq!(sid, "abc123");
            assert_eq!(ping_interval, 25000);
            assert_eq!(ping_timeout, 20000);
            assert_eq!(max_payload, Some(1_000_000));
        }
        other => panic!("Expected open packet, got {other:?}"),
    }
}

/// **VALUE**: Verifies that a corrupt open payload is a handshake error, not a framing error.
///
/// **BUG THIS CATCHES**: Would catch a bad open packet being ignored like an unknown frame.
#[test]
fn given_corrupt_open_frame_when_parsed_then_returns_handshake_error() {
    let result = Packet::parse("0{not json");

    assert!(matches!(result, Err(TransportError::Handshake { .. })));
}

/// **VALUE**: Verifies the message, ping and close packets.
#[test]
fn given_runtime_frames_when_parsed_then_map_to_packets() {
    assert_eq!(
        Packet::parse(r#"4{"a":1}"#).unwrap(),
        Packet::Message(String::from(r#"{"a":1}"#))
    );
    assert_eq!(Packet::parse("2").unwrap(), Packet::Ping(String::new()));
    assert_eq!(
        Packet::parse("2probe").unwrap(),
        Packet::Ping(String::from("probe"))
    );
    assert_eq!(Packet::parse("1").unwrap(), Packet::Close);
    assert_eq!(Packet::parse("6").unwrap(), Packet::Noop);
}

/// **VALUE**: Verifies that empty frames and unknown packet types are framing errors.
#[test]
fn given_unknown_or_empty_frame_when_parsed_then_returns_framing_error() {
    assert!(matches!(
        Packet::parse(""),
        Err(TransportError::Framing { .. })
    ));
    assert!(matches!(
        Packet::parse("9oops"),
        Err(TransportError::Framing { .. })
    ));
}

/// **VALUE**: Verifies the frames the client writes.
///
/// **BUG THIS CATCHES**: Would catch pongs not echoing the ping payload, which breaks the
/// `probe` exchange.
#[test]
fn given_client_packets_when_encoded_then_prefix_type_digit() {
    assert_eq!(Packet::Message(String::from("{}")).encode(), "4{}");
    assert_eq!(Packet::Pong(String::from("probe")).encode(), "3probe");
    assert_eq!(Packet::Pong(String::new()).encode(), "3");
    assert_eq!(Packet::Close.encode(), "1");
}

/// **VALUE**: Verifies the liveness window is interval plus timeout.
#[test]
fn given_handshake_when_liveness_window_computed_then_sums_interval_and_timeout() {
    let handshake = OpenHandshake {
        sid: String::from("s"),
        upgrades: Vec::new(),
        ping_interval: 300,
        ping_timeout: 200,
        max_payload: None,
    };

    assert_eq!(handshake.liveness_window(), Duration::from_millis(500));
}
