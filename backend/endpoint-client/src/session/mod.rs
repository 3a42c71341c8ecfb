//! The handle returned by a successful [`connect`](crate::connect).
//!
//! # Lifecycle
//!
//! A session exists only after the full handshake succeeded. It ends when the
//! transport closes, either because [`Session::disconnect`] was called or
//! because the server or network went away. Either way the close hook runs
//! once, from the transport's close event. Dropping the session closes the
//! transport as well.

pub(crate) mod close;

use crate::rpc::{Managers, PluginRuntime, RpcEngine};
use crate::transport::{CloseReason, TransportHandle};

use close::CloseNotifier;

use std::sync::Arc;

use log::debug;

pub struct Session<R: PluginRuntime> {
    version: String,
    system_manager: R::SystemManager,
    device_manager: R::DeviceManager,
    endpoint_manager: R::EndpointManager,
    media_manager: R::MediaManager,
    user_storage: <R::Engine as RpcEngine>::Param,
    engine: Arc<R::Engine>,
    transport: TransportHandle,
    close_notifier: CloseNotifier,
}

impl<R: PluginRuntime> Session<R> {
    pub(crate) fn new(
        version: String,
        managers: Managers<R>,
        user_storage: <R::Engine as RpcEngine>::Param,
        engine: Arc<R::Engine>,
        transport: TransportHandle,
        close_notifier: CloseNotifier,
    ) -> Self {
        Self {
            version,
            system_manager: managers.system_manager,
            device_manager: managers.device_manager,
            endpoint_manager: managers.endpoint_manager,
            media_manager: managers.media_manager,
            user_storage,
            engine,
            transport,
            close_notifier,
        }
    }

    /// Server version, or `"unknown"` when it could not be queried.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn system_manager(&self) -> &R::SystemManager {
        &self.system_manager
    }

    pub fn device_manager(&self) -> &R::DeviceManager {
        &self.device_manager
    }

    pub fn endpoint_manager(&self) -> &R::EndpointManager {
        &self.endpoint_manager
    }

    pub fn media_manager(&self) -> &R::MediaManager {
        &self.media_manager
    }

    pub fn user_storage(&self) -> &<R::Engine as RpcEngine>::Param {
        &self.user_storage
    }

    pub fn engine(&self) -> &Arc<R::Engine> {
        &self.engine
    }

    /// Engine.IO session id of the underlying transport.
    pub fn session_id(&self) -> &str {
        self.transport.session_id()
    }

    /// Close the transport. Safe to call any number of times.
    pub fn disconnect(&self) {
        self.transport.close();
    }

    /// Set the hook run when the transport closes, replacing any earlier one.
    ///
    /// The hook runs at most once per session. If the transport has already
    /// closed, it is not run.
    pub fn on_close<F>(&self, hook: F)
    where
        F: FnOnce(CloseReason) + Send + 'static,
    {
        if !self.close_notifier.set_hook(Box::new(hook)) {
            debug!("Close hook set after the session closed; it will not run");
        }
    }

    /// True once the transport has closed and the close hook, if any, has run.
    pub fn is_closed(&self) -> bool {
        self.close_notifier.is_done()
    }

    /// Resolves once the transport has closed and the close hook, if any, has run.
    pub async fn closed(&self) {
        self.close_notifier.wait().await;
    }
}

impl<R: PluginRuntime> Drop for Session<R> {
    fn drop(&mut self) {
        self.transport.close();
    }
}
