use crate::helpers::endpoint_server::TEST_SESSION_ID;
use crate::helpers::{EndpointBehavior, ServerCommand, spawn_endpoint, within};

use endpoint_client::TlsPolicy;
use endpoint_client::transport::{
    self, CloseReason, TransportConfig, TransportEvent, WireMessage,
};

use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderValue};
use url::Url;

fn config_for(base_url: &str, headers: HeaderMap) -> TransportConfig {
    TransportConfig {
        root_location: Url::parse(base_url).expect("URL should parse"),
        path: String::from("/endpoint/core/engine.io/api/"),
        headers,
        tls_policy: TlsPolicy::Verify,
    }
}

/// **VALUE**: Verifies that extra headers are sent on the upgrade request.
///
/// **WHY THIS MATTERS**: The login cookie rides on the upgrade request. If it is dropped, the
/// server treats the client as anonymous.
///
/// **BUG THIS CATCHES**: Would catch building the upgrade request without the configured headers.
#[tokio::test]
async fn given_cookie_header_when_opening_then_upgrade_request_carries_it() {
    // GIVEN: A config with a Cookie header
    let mut server = spawn_endpoint(EndpointBehavior::default()).await;
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("login_user_token=abc123"));

    // WHEN: Opening the transport
    let (handle, _events) = within(transport::open(&config_for(&server.base_url(), headers)))
        .await
        .expect("Transport should open");

    // THEN: The server saw the cookie, and the handshake values are exposed
    let upgrade = server.upgrades.recv().await.expect("Upgrade recorded");
    assert_eq!(upgrade.cookie.as_deref(), Some("login_user_token=abc123"));
    assert_eq!(handle.session_id(), TEST_SESSION_ID);
    assert_eq!(handle.handshake().ping_interval, 25_000);
    assert_eq!(handle.handshake().ping_timeout, 20_000);
}

/// **VALUE**: Verifies both directions of message packets and the final close event.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - Outbound text is not framed as an Engine.IO message packet (`4` prefix)
/// - Inbound message packets keep their `4` prefix
/// - `Closed` is not the last event after `close()`
#[tokio::test]
async fn given_open_transport_when_exchanging_messages_then_framing_is_applied() {
    let mut server = spawn_endpoint(EndpointBehavior::default()).await;
    let (handle, mut events) =
        within(transport::open(&config_for(&server.base_url(), HeaderMap::new())))
            .await
            .expect("Transport should open");

    // Outbound
    handle.send(r#"{"hello":"server"}"#).expect("Send should queue");
    within(server.expect_frame(r#"4{"hello":"server"}"#)).await;

    // Inbound
    server
        .commands
        .send(ServerCommand::Push(String::from(r#"{"hello":"client"}"#)))
        .expect("Server task should be running");
    let event = within(events.next()).await;
    assert_eq!(
        event,
        Some(TransportEvent::Message(WireMessage::Text(String::from(
            r#"{"hello":"client"}"#
        ))))
    );

    // Close
    handle.close();
    handle.close();
    within(handle.closed()).await;
    assert!(handle.is_closed());
    assert_eq!(
        within(events.next()).await,
        Some(TransportEvent::Closed(CloseReason::ClientRequested))
    );
    assert_eq!(within(events.next()).await, None);
}

/// **VALUE**: Verifies that sending after close fails instead of silently queueing.
///
/// **BUG THIS CATCHES**: Would catch messages disappearing into a dead channel.
#[tokio::test]
async fn given_closed_transport_when_sending_then_fails_with_closed_error() {
    let server = spawn_endpoint(EndpointBehavior::default()).await;
    let (handle, _events) =
        within(transport::open(&config_for(&server.base_url(), HeaderMap::new())))
            .await
            .expect("Transport should open");

    handle.close();
    within(handle.closed()).await;

    assert!(matches!(
        handle.send("late"),
        Err(endpoint_client::error::TransportError::Closed { .. })
    ));
}
