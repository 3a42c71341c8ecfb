use crate::options::TlsPolicy;
use crate::transport::TransportConfig;

use tokio_tungstenite::tungstenite::http::HeaderMap;
use url::Url;

fn config(root: &str, path: &str) -> TransportConfig {
    TransportConfig {
        root_location: Url::parse(root).unwrap(),
        path: path.to_string(),
        headers: HeaderMap::new(),
        tls_policy: TlsPolicy::Verify,
    }
}

/// **VALUE**: Verifies the websocket URL built from an https root location.
///
/// **WHY THIS MATTERS**: The server only upgrades requests that carry the Engine.IO protocol
/// version and transport name in the query string.
///
/// **BUG THIS CATCHES**: Would catch https not mapping to wss, a lost port, or missing query
/// parameters.
#[test]
fn given_https_root_when_websocket_url_built_then_uses_wss_and_engine_io_query() {
    // GIVEN: An https root with explicit port
    let config = config("https://192.168.1.20:10443", "/endpoint/core/engine.io/api/");

    // WHEN: Building the websocket URL
    let url = config.websocket_url().unwrap();

    // THEN: Scheme, authority, path and query are as expected
    assert_eq!(
        url.as_str(),
        "wss://192.168.1.20:10443/endpoint/core/engine.io/api/?EIO=4&transport=websocket"
    );
}

/// **VALUE**: Verifies that the root location's own path does not leak into the transport URL.
///
/// **BUG THIS CATCHES**: Would catch joining the Engine.IO path onto a base path.
#[test]
fn given_root_with_path_when_websocket_url_built_then_path_is_replaced() {
    let config = config("http://localhost:11080/some/base", "/endpoint/x/engine.io/api/");

    let url = config.websocket_url().unwrap();

    assert_eq!(url.scheme(), "ws");
    assert_eq!(url.path(), "/endpoint/x/engine.io/api/");
    assert_eq!(url.port(), Some(11080));
}

/// **VALUE**: Verifies that non-web schemes are rejected.
#[test]
fn given_unsupported_scheme_when_websocket_url_built_then_returns_error() {
    let config = config("ftp://example.com", "/endpoint/core/engine.io/api/");

    assert!(config.websocket_url().is_err());
}
