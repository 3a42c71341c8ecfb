use crate::helpers::tls::spawn_https_login;
use crate::helpers::{EndpointBehavior, FakeRuntime, spawn_tls_endpoint, within};

use endpoint_client::error::{ConnectError, LoginError, TransportError};
use endpoint_client::login::fetch_session_cookie;
use endpoint_client::{ConnectionOptions, Credentials, TlsPolicy, connect};

use common::RedactedSecret;

use url::Url;

fn credentials() -> Credentials {
    Credentials {
        username: String::from("admin"),
        password: RedactedSecret::new("hunter2"),
    }
}

fn options_for(base_url: &str, tls_policy: TlsPolicy) -> ConnectionOptions {
    ConnectionOptions::builder()
        .with_base_url(base_url)
        .with_plugin_id("core")
        .with_tls_policy(tls_policy)
        .build()
        .expect("Options should be valid")
}

/// **VALUE**: Verifies that the default policy refuses a self-signed `wss://` endpoint.
///
/// **WHY THIS MATTERS**: `Verify` is the default. If it quietly accepted any certificate, every
/// client would be open to interception without ever opting in.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - `Verify` is mapped to the accept-any verifier
/// - The TLS connector is skipped for `https` roots
#[tokio::test]
async fn given_self_signed_endpoint_when_connecting_with_verify_then_fails_with_connect_error() {
    // GIVEN: A wss endpoint with a self-signed certificate
    let server = spawn_tls_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();

    // WHEN: Connecting with the default policy
    let result = within(connect(
        &options_for(&server.base_url(), TlsPolicy::Verify),
        &runtime,
    ))
    .await;

    // THEN: The websocket never opens and no engine is built
    match result {
        Err(ConnectError::Transport(TransportError::Connect { .. })) => {}
        Err(other) => panic!("Expected a transport connect error, got {other:?}"),
        Ok(_) => panic!("Connect should not trust a self-signed certificate"),
    }
    assert!(runtime.created_engines().is_empty());
}

/// **VALUE**: Verifies that opting in to invalid certificates reaches a self-signed endpoint.
///
/// **WHY THIS MATTERS**: Endpoint servers on a LAN usually present a self-signed certificate.
/// This policy is the only way to reach them.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The accept-any verifier rejects a valid signature
/// - The policy is not carried from the options into the transport
#[tokio::test]
async fn given_self_signed_endpoint_when_connecting_with_accept_invalid_then_session_opens() {
    let server = spawn_tls_endpoint(EndpointBehavior::default()).await;
    let runtime = FakeRuntime::default();

    let session = within(connect(
        &options_for(&server.base_url(), TlsPolicy::AcceptInvalidCertificates),
        &runtime,
    ))
    .await
    .expect("Connect should succeed");

    assert_eq!(session.version(), "0.123.4");
    session.disconnect();
}

/// **VALUE**: Verifies that login under `Verify` trusts the same roots as the transport.
///
/// **WHY THIS MATTERS**: The password is sent in the login body. A login that accepted a
/// certificate the transport would refuse leaks it to an interceptor.
///
/// **BUG THIS CATCHES**: Would catch the login client ignoring the TLS policy.
#[tokio::test]
async fn given_self_signed_login_server_when_logging_in_with_verify_then_fails_with_http_error() {
    // GIVEN: An HTTPS login route with a self-signed certificate
    let mut server = spawn_https_login("login_user_token=abc123").await;
    let base_url = Url::parse(&server.base_url()).expect("URL should parse");
    let credentials = credentials();

    // WHEN: Logging in with the default policy
    let result = within(fetch_session_cookie(&base_url, &credentials, TlsPolicy::Verify)).await;

    // THEN: The request fails before any HTTP request is made
    assert!(
        matches!(result, Err(LoginError::Http { .. })),
        "Expected an HTTP error, got {result:?}"
    );
    assert!(server.requests.try_recv().is_err(), "No request should get through");
}

/// **VALUE**: Verifies that login accepts a self-signed certificate when allowed.
///
/// **BUG THIS CATCHES**: Would catch `AcceptInvalidCertificates` only applying to the transport.
#[tokio::test]
async fn given_self_signed_login_server_when_logging_in_with_accept_invalid_then_returns_cookie() {
    let mut server = spawn_https_login("login_user_token=abc123").await;
    let base_url = Url::parse(&server.base_url()).expect("URL should parse");
    let credentials = credentials();

    let cookie = within(fetch_session_cookie(
        &base_url,
        &credentials,
        TlsPolicy::AcceptInvalidCertificates,
    ))
    .await
    .expect("Login should succeed");

    assert_eq!(cookie.expose(), "login_user_token=abc123");
    let request_line = within(server.requests.recv()).await.expect("Request recorded");
    assert!(request_line.starts_with("POST /login "));
}
