//! Test doubles for integration tests:
//! - an Engine.IO websocket endpoint that answers a tiny JSON RPC dialect
//! - a `PluginRuntime` speaking that dialect from the client side
//! - a self-signed certificate for `wss://` and `https://` variants of the servers

pub mod endpoint_server;
pub mod fake_runtime;
pub mod tls;

pub use endpoint_server::{
    EndpointBehavior, EndpointServer, ServerCommand, spawn_endpoint, spawn_tls_endpoint,
};
pub use fake_runtime::{FakeEngine, FakeRuntime};

use std::future::Future;
use std::time::Duration;

/// Upper bound for anything a test awaits.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, future)
        .await
        .expect("operation did not finish in time")
}
