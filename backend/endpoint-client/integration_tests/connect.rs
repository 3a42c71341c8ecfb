use crate::helpers::endpoint_server::TEST_SESSION_ID;
use crate::helpers::fake_runtime::RemoteHandle;
use crate::helpers::{EndpointBehavior, FakeRuntime, spawn_endpoint, within};

use endpoint_client::error::{ConnectError, LoginError, TransportError};
use endpoint_client::{ConnectionOptions, DEFAULT_CLIENT_NAME, RPC_ROUTING_TAG, connect};

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options_for(base_url: &str, plugin_id: &str) -> ConnectionOptions {
    ConnectionOptions::builder()
        .with_base_url(base_url)
        .with_plugin_id(plugin_id)
        .build()
        .expect("Options should be valid")
}

/// **VALUE**: Verifies the full happy path: transport path, handshake results and session contents.
///
/// **WHY THIS MATTERS**: This is the whole contract of `connect`. A session must only exist once
/// attachment, the `userStorage` fetch and the version probe have all completed.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The transport path is not `/endpoint/{plugin}/engine.io/api/`
/// - The Engine.IO query parameters are missing
/// - The engine is built with the wrong name or routing tag
/// - Managers, user storage or version are not carried into the session
#[tokio::test]
async fn given_healthy_endpoint_when_connecting_then_session_has_handshake_results() {
    // GIVEN: A healthy endpoint
    let mut server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let options = options_for(&server.base_url(), "core");

    // WHEN: Connecting
    let session = within(connect(&options, &runtime))
        .await
        .expect("Connect should succeed");

    // THEN: The upgrade went to the plugin's Engine.IO path
    let upgrade = server.upgrades.recv().await.expect("Upgrade recorded");
    assert_eq!(upgrade.path, "/endpoint/core/engine.io/api/");
    let query = upgrade.query.expect("Query string present");
    assert!(query.contains("EIO=4"));
    assert!(query.contains("transport=websocket"));
    assert!(upgrade.cookie.is_none(), "No cookie without credentials");

    // THEN: The engine was built once, with the default name and the core routing tag
    assert_eq!(
        runtime.created_engines(),
        vec![(DEFAULT_CLIENT_NAME.to_string(), RPC_ROUTING_TAG.to_string())]
    );

    // THEN: Session carries everything the handshake produced
    assert_eq!(session.version(), "0.123.4");
    assert_eq!(session.session_id(), TEST_SESSION_ID);
    assert_eq!(session.system_manager().name, "system");
    assert_eq!(session.device_manager(), &RemoteHandle(String::from("device")));
    assert_eq!(session.endpoint_manager(), &RemoteHandle(String::from("endpoint")));
    assert_eq!(session.media_manager(), &RemoteHandle(String::from("media")));
    assert_eq!(
        session.user_storage(),
        &json!({ "param": "userStorage", "owner": "user-1" })
    );
    assert!(!session.is_closed());
}

/// **VALUE**: Verifies that a scoped plugin id is used verbatim in the transport path.
///
/// **BUG THIS CATCHES**: Would catch percent-encoding the `@` or `/` of scoped package names.
#[tokio::test]
async fn given_scoped_plugin_id_when_connecting_then_path_contains_it_verbatim() {
    let mut server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let options = options_for(&server.base_url(), "@scrypted/core");

    let _session = within(connect(&options, &runtime))
        .await
        .expect("Connect should succeed");

    let upgrade = server.upgrades.recv().await.expect("Upgrade recorded");
    assert_eq!(upgrade.path, "/endpoint/@scrypted/core/engine.io/api/");
}

/// **VALUE**: Verifies that a custom client name reaches the engine.
#[tokio::test]
async fn given_client_name_when_connecting_then_engine_receives_it() {
    let server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let options = ConnectionOptions::builder()
        .with_base_url(server.base_url())
        .with_plugin_id("core")
        .with_client_name("kitchen-panel")
        .build()
        .expect("Options should be valid");

    let _session = within(connect(&options, &runtime))
        .await
        .expect("Connect should succeed");

    assert_eq!(
        runtime.created_engines(),
        vec![(String::from("kitchen-panel"), RPC_ROUTING_TAG.to_string())]
    );
}

/// **VALUE**: Verifies that a failing version query still yields a session, with version `unknown`.
///
/// **WHY THIS MATTERS**: Older servers lack the info component. The version is informational only
/// and must never block a connection.
///
/// **BUG THIS CATCHES**: Would catch propagating the version error out of `connect`.
#[tokio::test]
async fn given_version_query_fails_when_connecting_then_version_is_unknown() {
    let server = spawn_endpoint(EndpointBehavior {
        version: None,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();

    let session = within(connect(&options_for(&server.base_url(), "core"), &runtime))
        .await
        .expect("Connect should succeed despite version failure");

    assert_eq!(session.version(), "unknown");
}

/// **VALUE**: Verifies that a refused upgrade fails the attempt before any engine exists.
///
/// **WHY THIS MATTERS**: A transport error before the open packet must surface as that error,
/// with nothing left running.
///
/// **BUG THIS CATCHES**: Would catch building the engine (and spawning the pump) before the
/// transport is open, or swallowing the upgrade failure.
#[tokio::test]
async fn given_upgrade_refused_when_connecting_then_fails_with_transport_error() {
    let server = spawn_endpoint(EndpointBehavior {
        reject_upgrade: true,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();

    let result = within(connect(&options_for(&server.base_url(), "core"), &runtime)).await;

    assert!(matches!(
        result,
        Err(ConnectError::Transport(TransportError::Connect { .. }))
    ));
    assert!(runtime.created_engines().is_empty());
}

/// **VALUE**: Verifies that a server closing before the open packet fails the attempt.
///
/// **BUG THIS CATCHES**: Would catch waiting forever for an open packet that never comes.
#[tokio::test]
async fn given_close_before_open_packet_when_connecting_then_fails_with_transport_error() {
    let server = spawn_endpoint(EndpointBehavior {
        send_open: false,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();

    let result = within(connect(&options_for(&server.base_url(), "core"), &runtime)).await;

    assert!(matches!(
        result,
        Err(ConnectError::Transport(
            TransportError::Handshake { .. } | TransportError::Connect { .. }
        ))
    ));
    assert!(runtime.created_engines().is_empty());
}

/// **VALUE**: Verifies that nothing listening on the port is a transport error.
#[tokio::test]
async fn given_nothing_listening_when_connecting_then_fails_with_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let runtime = FakeRuntime::default();
    let result = within(connect(&options_for(&format!("http://{addr}"), "core"), &runtime)).await;

    assert!(matches!(
        result,
        Err(ConnectError::Transport(TransportError::Connect { .. }))
    ));
}

/// **VALUE**: Verifies that a transport close during attachment fails the attempt.
///
/// **WHY THIS MATTERS**: The attachment call waits for a reply that will never arrive once the
/// transport is gone. Without racing the close, `connect` would hang forever.
///
/// **BUG THIS CATCHES**: Would catch a close during the handshake being ignored.
#[tokio::test]
async fn given_close_during_attach_when_connecting_then_fails_with_closed_error() {
    let server = spawn_endpoint(EndpointBehavior {
        close_on_attach: true,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();

    let result = within(connect(&options_for(&server.base_url(), "core"), &runtime)).await;

    assert!(matches!(
        result,
        Err(ConnectError::Transport(TransportError::Closed { .. }))
    ));
    assert_eq!(runtime.created_engines().len(), 1);
}

/// **VALUE**: Verifies that abandoning `connect` part way through the handshake closes the
/// transport.
///
/// **WHY THIS MATTERS**: Callers bound `connect` with `tokio::time::timeout`. The inbound pump
/// keeps the engine, and through it the transport, alive; without an explicit close the socket
/// stays open and keeps answering pings after the caller has given up.
///
/// **BUG THIS CATCHES**: Would catch the transport only being closed on an `Err` return, which a
/// dropped future never reaches.
#[tokio::test]
async fn given_attach_never_answered_when_connect_times_out_then_transport_is_closed() {
    // GIVEN: An endpoint that keeps the connection alive but never answers attach
    let mut server = spawn_endpoint(EndpointBehavior {
        ignore_attach: true,
        ping_period: Some(Duration::from_millis(100)),
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();
    let options = options_for(&server.base_url(), "core");

    // WHEN: The caller gives up while attach is pending
    let attempt = tokio::time::timeout(Duration::from_millis(300), connect(&options, &runtime)).await;
    assert!(attempt.is_err(), "Connect should still be waiting for attach");

    // THEN: The server receives a close packet
    tokio::time::timeout(Duration::from_secs(2), server.expect_frame("1"))
        .await
        .expect("Transport should close once the attempt is dropped");
}

/// **VALUE**: Verifies that inbound messages reach the engine in arrival order.
///
/// **WHY THIS MATTERS**: RPC results and events are correlated by order; reordering breaks
/// request/response matching and event sequencing.
///
/// **BUG THIS CATCHES**: Would catch concurrent dispatch of inbound frames.
#[tokio::test]
async fn given_pushed_events_when_connecting_then_engine_sees_them_in_order() {
    let pushes = (1..=20)
        .map(|seq| json!({ "type": "event", "seq": seq }).to_string())
        .collect();
    let server = spawn_endpoint(EndpointBehavior {
        pushes_after_attach: pushes,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();

    let session = within(connect(&options_for(&server.base_url(), "core"), &runtime))
        .await
        .expect("Connect should succeed");

    // Pushes precede the version reply on the wire, so they are all delivered by now
    let sequence: Vec<u64> = session
        .engine()
        .received()
        .iter()
        .filter(|message| message.get("type") == Some(&Value::from("event")))
        .filter_map(|message| message.get("seq").and_then(Value::as_u64))
        .collect();
    assert_eq!(sequence, (1..=20).collect::<Vec<_>>());
}

/// **VALUE**: Verifies that an undecodable frame is dropped and later frames still arrive.
///
/// **BUG THIS CATCHES**: Would catch a decode error tearing down the session.
#[tokio::test]
async fn given_malformed_frame_when_connecting_then_later_frames_still_delivered() {
    let server = spawn_endpoint(EndpointBehavior {
        pushes_after_attach: vec![
            String::from("not json"),
            String::from("[1,2,3]"),
            json!({ "type": "event", "seq": 1 }).to_string(),
        ],
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();

    let session = within(connect(&options_for(&server.base_url(), "core"), &runtime))
        .await
        .expect("Connect should succeed");

    let events = session
        .engine()
        .received()
        .into_iter()
        .filter(|message| message.get("type") == Some(&Value::from("event")))
        .count();
    assert_eq!(events, 1);
    assert!(!session.is_closed());
}

/// **VALUE**: Verifies that a rejected login fails `connect` before any transport is opened.
///
/// **WHY THIS MATTERS**: Opening an unauthenticated transport after a failed login would leak a
/// half-open connection and confuse the server.
///
/// **BUG THIS CATCHES**: Would catch continuing to the transport after a login failure.
#[tokio::test]
async fn given_login_rejected_when_connecting_then_fails_without_transport() {
    // GIVEN: The only server rejects the login and counts any other request
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&server)
        .await;

    let options = ConnectionOptions::builder()
        .with_base_url(server.uri())
        .with_plugin_id("core")
        .with_credentials("admin", "wrong")
        .build()
        .expect("Options should be valid");
    let runtime = FakeRuntime::default();

    // WHEN: Connecting
    let error = within(connect(&options, &runtime))
        .await
        .err()
        .expect("Connect should fail");

    // THEN: Login error with the status text, and no engine was ever built
    match error {
        ConnectError::Login(login) => {
            assert!(matches!(login, LoginError::Authentication { .. }));
            assert_eq!(login.to_string(), "status 401");
        }
        other => panic!("Expected login error, got {other:?}"),
    }
    assert!(runtime.created_engines().is_empty());
}
