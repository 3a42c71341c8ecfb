use crate::helpers::{EndpointBehavior, FakeRuntime, ServerCommand, spawn_endpoint, within};

use endpoint_client::transport::CloseReason;
use endpoint_client::{ConnectionOptions, connect};

use std::sync::{Arc, Mutex};
use std::time::Duration;

fn options_for(base_url: &str) -> ConnectionOptions {
    ConnectionOptions::builder()
        .with_base_url(base_url)
        .with_plugin_id("core")
        .build()
        .expect("Options should be valid")
}

/// Hook that records every reason it is called with.
fn recording_hook() -> (Arc<Mutex<Vec<CloseReason>>>, impl FnOnce(CloseReason) + Send + 'static) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&calls);
    (calls, move |reason| sink.lock().unwrap().push(reason))
}

/// **VALUE**: Verifies that `disconnect` closes the session and runs the hook exactly once.
///
/// **WHY THIS MATTERS**: Applications reconnect from the close hook. Calling `disconnect` twice
/// (UI button plus shutdown path) must not produce two reconnects.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `disconnect` does not close the transport
/// - The hook runs once per `disconnect` call
/// - The close reason is not reported as client-requested
#[tokio::test]
async fn given_session_when_disconnected_twice_then_hook_runs_once() {
    // GIVEN: A connected session with a recording hook
    let mut server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let session = within(connect(&options_for(&server.base_url()), &runtime))
        .await
        .expect("Connect should succeed");
    let (calls, hook) = recording_hook();
    session.on_close(hook);

    // WHEN: Disconnecting twice
    session.disconnect();
    session.disconnect();
    within(session.closed()).await;

    // THEN: One hook call, client-requested, and the server saw a close packet
    assert_eq!(*calls.lock().unwrap(), vec![CloseReason::ClientRequested]);
    assert!(session.is_closed());
    within(server.expect_frame("1")).await;
}

/// **VALUE**: Verifies that a server-initiated close runs the hook with `ServerClosed`.
///
/// **BUG THIS CATCHES**: Would catch the close packet being treated as a message or ignored.
#[tokio::test]
async fn given_session_when_server_closes_then_hook_reports_server_closed() {
    let server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let session = within(connect(&options_for(&server.base_url()), &runtime))
        .await
        .expect("Connect should succeed");
    let (calls, hook) = recording_hook();
    session.on_close(hook);

    server
        .commands
        .send(ServerCommand::Close)
        .expect("Server task should be running");
    within(session.closed()).await;

    assert_eq!(*calls.lock().unwrap(), vec![CloseReason::ServerClosed]);

    // Later disconnects are harmless and do not re-run the hook
    session.disconnect();
    assert_eq!(calls.lock().unwrap().len(), 1);
}

/// **VALUE**: Verifies that a hook set after close is never run.
///
/// **BUG THIS CATCHES**: Would catch a late hook running immediately with a stale reason.
#[tokio::test]
async fn given_closed_session_when_setting_hook_then_hook_not_run() {
    let server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let session = within(connect(&options_for(&server.base_url()), &runtime))
        .await
        .expect("Connect should succeed");

    session.disconnect();
    within(session.closed()).await;

    let (calls, hook) = recording_hook();
    session.on_close(hook);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(calls.lock().unwrap().is_empty());
}

/// **VALUE**: Verifies that server pings are answered with pongs.
///
/// **WHY THIS MATTERS**: Engine.IO servers drop clients that stop answering pings. A client
/// that ignores them is disconnected after `pingInterval + pingTimeout`.
///
/// **BUG THIS CATCHES**: Would catch pings being forwarded to the engine instead of answered.
#[tokio::test]
async fn given_server_ping_when_connected_then_client_answers_pong() {
    let mut server = spawn_endpoint(EndpointBehavior {
        ping_after_open: true,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();
    let session = within(connect(&options_for(&server.base_url()), &runtime))
        .await
        .expect("Connect should succeed");

    within(server.expect_frame("3")).await;

    // The ping never reached the engine
    assert!(
        session
            .engine()
            .received()
            .iter()
            .all(|message| message.get("type").is_some())
    );
}

/// **VALUE**: Verifies that a silent server is detected within the liveness window.
///
/// **WHY THIS MATTERS**: A half-open TCP connection never errors by itself. Without ping
/// supervision the session would look alive forever.
///
/// **BUG THIS CATCHES**: Would catch the liveness deadline not being armed or not reset.
#[tokio::test]
async fn given_silent_server_when_window_expires_then_session_closes_with_ping_timeout() {
    // GIVEN: A server advertising a short window and never pinging
    let server = spawn_endpoint(EndpointBehavior {
        ping_interval: 150,
        ping_timeout: 150,
        ..EndpointBehavior::default()
    })
    .await;
    let runtime = FakeRuntime::default();
    let session = within(connect(&options_for(&server.base_url()), &runtime))
        .await
        .expect("Connect should succeed");
    let (calls, hook) = recording_hook();
    session.on_close(hook);

    // WHEN: Waiting past the window
    within(session.closed()).await;

    // THEN: Closed for ping timeout
    assert_eq!(*calls.lock().unwrap(), vec![CloseReason::PingTimeout]);
}

/// **VALUE**: Verifies that dropping a session closes the transport.
///
/// **BUG THIS CATCHES**: Would catch leaked background tasks keeping the socket open.
#[tokio::test]
async fn given_session_when_dropped_then_server_sees_close_packet() {
    let mut server = spawn_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();
    let session = within(connect(&options_for(&server.base_url()), &runtime))
        .await
        .expect("Connect should succeed");

    drop(session);

    within(server.expect_frame("1")).await;
}
