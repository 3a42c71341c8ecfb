//! Connection bootstrap: login, transport, bridge wiring and the attachment
//! handshake, in that order.
//!
//! # Protocol
//!
//! 1. With credentials, log in and put the session cookie in a `Cookie` header
//! 2. Open the Engine.IO transport at `/endpoint/{plugin_id}/engine.io/api/`
//! 3. Build the RPC engine around an [`OutboundSink`] and start the inbound pump
//! 4. Attach, fetch the `userStorage` parameter, probe the server version
//! 5. Return the [`Session`]
//!
//! Any failure before the session exists closes the transport (if one was
//! opened) and is returned. So does dropping the [`connect`] future part way
//! through. The version probe is the only step whose failure is absorbed.
//! There is no retry and no timeout; wrap [`connect`] in `tokio::time::timeout`
//! to bound it.

pub mod phase;

use crate::bridge::{OutboundSink, pump_inbound};
use crate::error::ConnectError;
use crate::error::login::LoginError;
use crate::error::transport::TransportError;
use crate::login::fetch_session_cookie;
use crate::options::ConnectionOptions;
use crate::rpc::{InfoComponent, PluginRuntime, RpcEngine, SystemManager};
use crate::session::Session;
use crate::session::close::CloseNotifier;
use crate::transport::{self, TransportConfig, TransportEvents, TransportHandle};
use crate::{INFO_COMPONENT, RPC_ROUTING_TAG, UNKNOWN_VERSION, USER_STORAGE_PARAM};

use phase::{ConnectionPhase, PhaseTracker};

use std::sync::Arc;

use log::{debug, info};
use tokio::spawn as TokioSpawn;
use tokio_tungstenite::tungstenite::http::header::COOKIE;
use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderValue};

/// Establish a session with the endpoint described by `options`.
///
/// # Errors
///
/// - [`ConnectError::Login`] if the credential exchange fails (no transport is opened)
/// - [`ConnectError::Transport`] if the transport fails before or during the handshake
/// - [`ConnectError::Rpc`] if the engine cannot be built, attachment fails or
///   the `userStorage` parameter cannot be fetched
pub async fn connect<R: PluginRuntime>(
    options: &ConnectionOptions,
    runtime: &R,
) -> Result<Session<R>, ConnectError> {
    let mut tracker = PhaseTracker::new(options.plugin_id());

    tracker.advance(ConnectionPhase::HeaderPreparation);
    let headers = match prepare_headers(options).await {
        Ok(headers) => headers,
        Err(e) => return Err(tracker.fail(e)),
    };

    tracker.advance(ConnectionPhase::TransportOpening);
    let config = transport_config(options, headers);
    let (transport, events) = match transport::open(&config).await {
        Ok(opened) => opened,
        Err(e) => return Err(tracker.fail(ConnectError::from(e))),
    };

    let guard = CloseOnDrop::new(transport.clone());

    tracker.advance(ConnectionPhase::Handshaking);
    match handshake(options, runtime, transport, events).await {
        Ok(session) => {
            guard.disarm();
            tracker.advance(ConnectionPhase::Ready);
            info!(
                "Connected to plugin {} (server version {}, sid {})",
                options.plugin_id(),
                session.version(),
                session.session_id()
            );
            Ok(session)
        }
        Err(e) => Err(tracker.fail(e)),
    }
}

/// Closes the transport when dropped, unless disarmed once the session owns it.
///
/// Covers both a failed handshake and a `connect` future dropped mid-handshake;
/// in the latter case the inbound pump would otherwise keep the transport alive.
struct CloseOnDrop {
    transport: Option<TransportHandle>,
}

impl CloseOnDrop {
    fn new(transport: TransportHandle) -> Self {
        Self {
            transport: Some(transport),
        }
    }

    fn disarm(mut self) {
        self.transport = None;
    }
}

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        if let Some(transport) = self.transport.take() {
            debug!("Connection attempt abandoned, closing transport {}", transport.session_id());
            transport.close();
        }
    }
}

/// Request headers for the transport upgrade.
///
/// Empty without credentials; otherwise holds the `Cookie` obtained by logging in.
pub async fn prepare_headers(options: &ConnectionOptions) -> Result<HeaderMap, ConnectError> {
    let mut headers = HeaderMap::new();

    let Some(credentials) = options.credentials() else {
        debug!("No credentials supplied, connecting without login");
        return Ok(headers);
    };

    let cookie =
        fetch_session_cookie(options.root_location(), credentials, options.tls_policy()).await?;

    let mut value = HeaderValue::from_str(cookie.expose()).map_err(|e| {
        LoginError::protocol(format!("Session cookie is not a valid header value: {e}"))
    })?;
    value.set_sensitive(true);
    headers.insert(COOKIE, value);

    Ok(headers)
}

pub fn transport_config(options: &ConnectionOptions, headers: HeaderMap) -> TransportConfig {
    TransportConfig {
        root_location: options.root_location().clone(),
        path: options.transport_path(),
        headers,
        tls_policy: options.tls_policy(),
    }
}

async fn handshake<R: PluginRuntime>(
    options: &ConnectionOptions,
    runtime: &R,
    transport: TransportHandle,
    events: TransportEvents,
) -> Result<Session<R>, ConnectError> {
    let outbound = OutboundSink::new(transport.clone());
    let engine = Arc::new(runtime.create_engine(
        options.client_name(),
        RPC_ROUTING_TAG,
        outbound,
    )?);

    let close_notifier = CloseNotifier::new();
    TokioSpawn(pump_inbound(
        Arc::clone(&engine),
        events,
        close_notifier.clone(),
    ));

    let exchange = async {
        let managers = runtime.attach(&engine).await?;
        let user_storage = engine.get_param(USER_STORAGE_PARAM).await?;
        let version = probe_version(&managers.system_manager).await;
        Ok::<_, ConnectError>((managers, user_storage, version))
    };

    let (managers, user_storage, version) = tokio::select! {
        biased;
        result = exchange => result?,
        _ = transport.closed() => {
            return Err(TransportError::closed("Transport closed during handshake").into());
        }
    };

    Ok(Session::new(
        version,
        managers,
        user_storage,
        engine,
        transport,
        close_notifier,
    ))
}

/// Ask the `info` component for the server version; `"unknown"` on any failure.
pub(crate) async fn probe_version<S: SystemManager>(system_manager: &S) -> String {
    let query = async {
        let info = system_manager.get_component(INFO_COMPONENT).await?;
        info.get_version().await
    };

    match query.await {
        Ok(version) => version,
        Err(e) => {
            debug!("Version probe failed, reporting '{UNKNOWN_VERSION}': {e}");
            String::from(UNKNOWN_VERSION)
        }
    }
}
