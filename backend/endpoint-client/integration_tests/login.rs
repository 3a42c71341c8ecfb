use endpoint_client::error::LoginError;
use endpoint_client::login::fetch_session_cookie;
use endpoint_client::{ConnectionOptions, Credentials, TlsPolicy};

use common::RedactedSecret;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials {
        username: String::from("admin"),
        password: RedactedSecret::new("hunter2"),
    }
}

fn base_url(server: &MockServer) -> Url {
    Url::parse(&server.uri()).expect("Mock server URI should parse")
}

/// **VALUE**: Verifies the login request shape and that the first `Set-Cookie` value is returned.
///
/// **WHY THIS MATTERS**: The server identifies the session by that cookie. Picking the wrong
/// header, or posting a body the server does not understand, leaves the transport unauthenticated.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The body is not JSON `{username, password}`
/// - The request is not a POST to `/login`
/// - A later `Set-Cookie` value is returned instead of the first
#[tokio::test]
async fn given_valid_credentials_when_logging_in_then_returns_first_cookie() {
    // GIVEN: A login endpoint that sets two cookies
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({ "username": "admin", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("set-cookie", "login_user_token=abc123; Path=/")
                .append_header("set-cookie", "other=ignored"),
        )
        .expect(1)
        .mount(&server)
        .await;

    // WHEN: Logging in
    let cookie = fetch_session_cookie(&base_url(&server), &credentials(), TlsPolicy::Verify)
        .await
        .expect("Login should succeed");

    // THEN: The first cookie comes back verbatim
    assert_eq!(cookie.expose(), "login_user_token=abc123; Path=/");
}

/// **VALUE**: Verifies that every non-200 status fails with message `status {code}`.
///
/// **WHY THIS MATTERS**: Callers match on this text to tell bad credentials from other failures.
///
/// **BUG THIS CATCHES**: Would catch treating any 2xx as success, or decorating the message
/// with location or prefixes.
#[tokio::test]
async fn given_non_200_status_when_logging_in_then_fails_with_status_message() {
    for status in [201_u16, 204, 401, 403, 500] {
        // GIVEN: A login endpoint answering with `status`
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(status).append_header("set-cookie", "should=not-matter"),
            )
            .mount(&server)
            .await;

        // WHEN: Logging in
        let error = fetch_session_cookie(&base_url(&server), &credentials(), TlsPolicy::Verify)
            .await
            .expect_err("Login should fail");

        // THEN: Authentication error carrying the status
        assert!(matches!(error, LoginError::Authentication { .. }));
        assert_eq!(error.to_string(), format!("status {status}"));
        assert_eq!(error.status_code().map(|code| code.0), Some(status));
    }
}

/// **VALUE**: Verifies that a 200 without `Set-Cookie` is a protocol error.
///
/// **BUG THIS CATCHES**: Would catch sending an empty `Cookie` header to the transport.
#[tokio::test]
async fn given_200_without_cookie_when_logging_in_then_fails_with_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let error = fetch_session_cookie(&base_url(&server), &credentials(), TlsPolicy::Verify)
        .await
        .expect_err("Login should fail");

    assert!(matches!(error, LoginError::Protocol { .. }));
    assert!(error.status_code().is_none());
}

/// **VALUE**: Verifies that a base URL path prefix is kept in front of `/login`.
///
/// **WHY THIS MATTERS**: Servers behind a reverse proxy are often mounted under a prefix.
///
/// **BUG THIS CATCHES**: Would catch `Url::join` semantics dropping the last path segment.
#[tokio::test]
async fn given_base_url_with_prefix_when_logging_in_then_posts_under_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrypted/login"))
        .respond_with(ResponseTemplate::new(200).append_header("set-cookie", "token=1"))
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&format!("{}/scrypted", server.uri())).expect("URL should parse");
    let cookie = fetch_session_cookie(&base, &credentials(), TlsPolicy::Verify)
        .await
        .expect("Login should succeed");

    assert_eq!(cookie.expose(), "token=1");
}

/// **VALUE**: Verifies that a refused connection surfaces as an HTTP error, not a status error.
///
/// **BUG THIS CATCHES**: Would catch network failures being reported as `status 0`.
#[tokio::test]
async fn given_unreachable_server_when_logging_in_then_fails_with_http_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let base = Url::parse(&format!("http://{addr}")).expect("URL should parse");
    let error = fetch_session_cookie(&base, &credentials(), TlsPolicy::Verify)
        .await
        .expect_err("Login should fail");

    assert!(matches!(error, LoginError::Http { .. }));
}

/// **VALUE**: Verifies that `prepare_headers` turns the login cookie into a sensitive `Cookie` header.
///
/// **WHY THIS MATTERS**: This header is the only thing authenticating the transport. Marking it
/// sensitive keeps it out of HTTP debug output.
///
/// **BUG THIS CATCHES**: Would catch the cookie landing under a different header name or the
/// sensitive flag being dropped.
#[tokio::test]
async fn given_credentials_when_preparing_headers_then_sets_sensitive_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).append_header("set-cookie", "token=xyz"))
        .mount(&server)
        .await;

    let options = ConnectionOptions::builder()
        .with_base_url(server.uri())
        .with_plugin_id("core")
        .with_credentials("admin", "hunter2")
        .build()
        .expect("Options should be valid");

    let headers = endpoint_client::bootstrap::prepare_headers(&options)
        .await
        .expect("Headers should be prepared");

    let cookie = headers.get("cookie").expect("Cookie header should be set");
    assert_eq!(cookie.to_str().expect("ASCII"), "token=xyz");
    assert!(cookie.is_sensitive());
}

/// **VALUE**: Verifies that without credentials no login request is made.
///
/// **BUG THIS CATCHES**: Would catch logging in with empty credentials.
#[tokio::test]
async fn given_no_credentials_when_preparing_headers_then_skips_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let options = ConnectionOptions::builder()
        .with_base_url(server.uri())
        .with_plugin_id("core")
        .build()
        .expect("Options should be valid");

    let headers = endpoint_client::bootstrap::prepare_headers(&options)
        .await
        .expect("Headers should be prepared");

    assert!(headers.is_empty());
}
