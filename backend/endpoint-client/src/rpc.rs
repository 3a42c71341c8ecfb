//! Contract with the RPC layer that runs on top of an established transport.
//!
//! The client does not know the RPC wire format. It constructs an engine with
//! an [`OutboundSink`], feeds it decoded inbound messages, asks it for session
//! parameters and runs the attachment handshake that yields the remote
//! managers. Applications plug their RPC implementation in by implementing
//! [`PluginRuntime`].

use crate::bridge::{OutboundSink, RpcMessage};
use crate::error::rpc::RpcError;

use std::future::Future;
use std::sync::Arc;

/// A message-dispatch engine bound to one transport.
pub trait RpcEngine: Send + Sync + 'static {
    /// Value type of named session parameters.
    type Param: Send + Sync + 'static;

    /// Deliver one inbound message. Called in transport order, one at a time.
    fn handle_message(&self, message: RpcMessage);

    fn get_param(&self, name: &str) -> impl Future<Output = Result<Self::Param, RpcError>> + Send;
}

/// Component exposing the server version.
pub trait InfoComponent: Send + Sync {
    fn get_version(&self) -> impl Future<Output = Result<String, RpcError>> + Send;
}

pub trait SystemManager: Send + Sync + 'static {
    type Component: InfoComponent;

    fn get_component(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Self::Component, RpcError>> + Send;
}

/// Manager handles returned by the attachment handshake.
pub struct Managers<R: PluginRuntime + ?Sized> {
    pub system_manager: R::SystemManager,
    pub device_manager: R::DeviceManager,
    pub endpoint_manager: R::EndpointManager,
    pub media_manager: R::MediaManager,
}

/// The RPC implementation an application connects with.
pub trait PluginRuntime: Send + Sync {
    type Engine: RpcEngine;
    type SystemManager: SystemManager;
    type DeviceManager: Send + Sync + 'static;
    type EndpointManager: Send + Sync + 'static;
    type MediaManager: Send + Sync + 'static;

    /// Build an engine that writes through `outbound`.
    fn create_engine(
        &self,
        client_name: &str,
        routing_tag: &str,
        outbound: OutboundSink,
    ) -> Result<Self::Engine, RpcError>;

    /// Run the remote attachment handshake. May exchange any number of
    /// messages over the engine before completing.
    fn attach(
        &self,
        engine: &Arc<Self::Engine>,
    ) -> impl Future<Output = Result<Managers<Self>, RpcError>> + Send;
}
