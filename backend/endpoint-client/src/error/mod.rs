pub mod bridge;
pub mod config;
pub mod login;
pub mod options;
pub mod rpc;
pub mod transport;

pub use bridge::BridgeError;
pub use config::ConfigError;
pub use login::LoginError;
pub use options::OptionsError;
pub use rpc::RpcError;
pub use transport::TransportError;

use thiserror::Error;

/// Every way a connection attempt can fail.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}
