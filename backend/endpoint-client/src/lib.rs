pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod error;
pub mod login;
pub mod options;
pub mod rpc;
pub mod session;
pub mod transport;

mod tls;

#[cfg(test)]
mod tests;

pub use bootstrap::connect;
pub use options::{ConnectionOptions, ConnectionOptionsBuilder, Credentials, TlsPolicy};
pub use session::Session;

pub const DEFAULT_SERVER_HOSTNAME: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: u16 = 10443;
pub const DEFAULT_ROOT_LOCATION: &str =
    const_format::concatcp!("https://", DEFAULT_SERVER_HOSTNAME, ":", DEFAULT_SERVER_PORT);

/// Display name handed to the RPC engine when the caller gives none.
pub const DEFAULT_CLIENT_NAME: &str = "engine.io-client";

/// Routing tag the RPC engine is constructed with.
pub const RPC_ROUTING_TAG: &str = "core";

pub const LOGIN_PATH: &str = "login";
pub const ENDPOINT_PATH_PREFIX: &str = "/endpoint/";
pub const ENGINE_IO_PATH_SUFFIX: &str = "/engine.io/api/";

/// Session parameter holding the per-user storage handle.
pub const USER_STORAGE_PARAM: &str = "userStorage";
pub const INFO_COMPONENT: &str = "info";
pub const UNKNOWN_VERSION: &str = "unknown";
