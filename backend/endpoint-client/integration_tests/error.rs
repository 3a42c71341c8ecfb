use endpoint_client::error::{
    BridgeError, ConnectError, LoginError, OptionsError, RpcError, TransportError,
};

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that transport errors include file/line location tracking.
///
/// **WHY THIS MATTERS**: Connection failures are reported far from where they happen. The
/// location tells developers which step of the handshake produced them.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `#[track_caller]` is removed from the constructors
/// - The Display implementation drops the location
#[test]
fn given_transport_error_when_formatted_then_includes_location() {
    // GIVEN: A Closed error built here
    let err = TransportError::closed("Transport closed during handshake");

    // WHEN: Formatting the error as string
    let error_string = err.to_string();

    // THEN: Type, message and this file are present
    assert!(error_string.contains("Transport Closed"));
    assert!(error_string.contains("Transport closed during handshake"));
    assert!(error_string.contains("error.rs"));
}

/// **VALUE**: Verifies that `ConnectError` is transparent over its parts.
///
/// **BUG THIS CATCHES**: Would catch a wrapper prefix changing the `status {code}` text callers
/// match on.
#[test]
fn given_login_error_when_wrapped_then_message_unchanged() {
    let err: ConnectError = LoginError::authentication(401_u16).into();

    assert_eq!(err.to_string(), "status 401");
}

/// **VALUE**: Verifies that RPC and bridge errors carry their caller's location.
#[test]
fn given_rpc_and_bridge_errors_when_formatted_then_include_location() {
    let rpc = RpcError::unavailable("No component named info");
    let bridge = BridgeError::decode("Expected a JSON object, received array");

    assert!(rpc.to_string().contains("Unavailable Error: No component named info"));
    assert!(rpc.to_string().contains("error.rs"));
    assert!(bridge.to_string().contains("error.rs"));
}

/// **VALUE**: Verifies that bridge errors wrap transport errors without re-decorating them.
#[test]
fn given_transport_error_when_converted_to_bridge_error_then_transparent() {
    let transport = TransportError::closed("Transport is closed");
    let expected = transport.to_string();

    let bridge = BridgeError::from(transport);

    assert_eq!(bridge.to_string(), expected);
}

/// **VALUE**: Verifies that validation errors built by hand render like built ones.
#[test]
fn given_options_error_when_formatted_then_includes_message_and_location() {
    let err = OptionsError::Validation {
        message: String::from("Plugin ID is required"),
        location: ErrorLocation::from(Location::caller()),
    };

    let error_string = err.to_string();

    assert!(error_string.contains("Validation Error: Plugin ID is required"));
    assert!(error_string.contains("error.rs"));
}
