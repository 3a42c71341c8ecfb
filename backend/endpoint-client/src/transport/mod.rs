//! Duplex message transport to a plugin endpoint.
//!
//! A websocket carrying Engine.IO v4 packets. [`open`] resolves only after the
//! server's open packet has arrived, so "connected" always means the
//! Engine.IO session exists. From then on a driver task owns the socket:
//!
//! - answers server pings and enforces the liveness window
//! - forwards inbound messages, in order, on the [`TransportEvents`] channel
//! - writes outbound messages queued through any [`TransportHandle`] clone
//! - reports exactly one [`TransportEvent::Closed`] when the socket goes away

pub mod engine_io;

use crate::error::transport::TransportError;
use crate::options::TlsPolicy;
use crate::tls;

use engine_io::{OpenHandshake, Packet};

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, trace, warn};
use tokio::net::TcpStream;
use tokio::spawn as TokioSpawn;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderMap;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async_tls_with_config};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWrite = SplitSink<WsStream, Message>;
type WsRead = SplitStream<WsStream>;

/// Where and how to open the transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Scheme, host and port of the server; any path is ignored.
    pub root_location: Url,
    /// Engine.IO path, e.g. `/endpoint/core/engine.io/api/`.
    pub path: String,
    /// Extra headers for the websocket upgrade request.
    pub headers: HeaderMap,
    pub tls_policy: TlsPolicy,
}

impl TransportConfig {
    /// `ws(s)://host[:port]{path}?EIO=4&transport=websocket`
    pub fn websocket_url(&self) -> Result<Url, TransportError> {
        let scheme = match self.root_location.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(TransportError::url(format!(
                    "Unsupported scheme for transport: {other}"
                )));
            }
        };

        let host = self
            .root_location
            .host_str()
            .ok_or_else(|| TransportError::url("Root location has no host"))?;

        let authority = match self.root_location.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let mut url = Url::parse(&format!("{scheme}://{authority}"))?;
        url.set_path(&self.path);
        url.query_pairs_mut()
            .append_pair("EIO", engine_io::PROTOCOL_VERSION)
            .append_pair("transport", engine_io::TRANSPORT_NAME);

        Ok(url)
    }
}

/// A message as the transport delivers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    Text(String),
    Binary(Vec<u8>),
}

/// Why the transport closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// [`TransportHandle::close`] was called, or every handle was dropped.
    ClientRequested,
    /// The server sent an Engine.IO close packet or a websocket close frame.
    ServerClosed,
    /// The socket ended without a close handshake.
    ConnectionLost,
    /// No packet arrived within the liveness window.
    PingTimeout,
    Error(String),
}

impl Display for CloseReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        match self {
            CloseReason::ClientRequested => write!(formatter, "client requested close"),
            CloseReason::ServerClosed => write!(formatter, "server closed"),
            CloseReason::ConnectionLost => write!(formatter, "connection lost"),
            CloseReason::PingTimeout => write!(formatter, "ping timeout"),
            CloseReason::Error(message) => write!(formatter, "transport error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message(WireMessage),
    /// Always the last event.
    Closed(CloseReason),
}

/// Inbound side of an open transport.
#[derive(Debug)]
pub struct TransportEvents {
    rx: mpsc::UnboundedReceiver<TransportEvent>,
}

impl TransportEvents {
    /// Next event, or `None` once the driver is gone and the channel drained.
    pub async fn next(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

enum Outbound {
    Packet(Packet),
    Close,
}

/// Cloneable sending side of an open transport.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    outbound: mpsc::UnboundedSender<Outbound>,
    closing: Arc<AtomicBool>,
    closed: watch::Receiver<bool>,
    handshake: Arc<OpenHandshake>,
}

impl TransportHandle {
    /// Engine.IO session id assigned by the server.
    pub fn session_id(&self) -> &str {
        &self.handshake.sid
    }

    pub fn handshake(&self) -> &OpenHandshake {
        &self.handshake
    }

    /// Queue a text message.
    pub fn send(&self, payload: impl Into<String>) -> Result<(), TransportError> {
        self.queue(Outbound::Packet(Packet::Message(payload.into())))
    }

    /// Close the transport. Calling this more than once has no further effect.
    pub fn close(&self) {
        if self.closing.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("Closing transport {}", self.handshake.sid);
        // The driver may already be gone; then the socket is closed anyway.
        let _ = self.outbound.send(Outbound::Close);
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the driver has shut the socket down.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        // An error means the driver dropped its sender, which only happens on exit.
        let _ = closed.wait_for(|is_closed| *is_closed).await;
    }

    fn queue(&self, outbound: Outbound) -> Result<(), TransportError> {
        if self.closing.load(Ordering::SeqCst) || self.is_closed() {
            return Err(TransportError::closed("Transport is closed"));
        }
        self.outbound
            .send(outbound)
            .map_err(|_| TransportError::closed("Transport driver has stopped"))
    }
}

/// Open the transport and wait for the Engine.IO open packet.
///
/// # Errors
///
/// - [`TransportError::Url`] if the websocket URL cannot be formed
/// - [`TransportError::Tls`] if the TLS configuration cannot be built
/// - [`TransportError::Connect`] if the websocket connection or upgrade fails
/// - [`TransportError::Handshake`] if the first frame is not a valid open packet
pub async fn open(
    config: &TransportConfig,
) -> Result<(TransportHandle, TransportEvents), TransportError> {
    let url = config.websocket_url()?;

    let mut request = url.as_str().into_client_request()?;
    request.headers_mut().extend(config.headers.clone());

    let connector = match url.scheme() {
        "wss" => Some(tls::connector(config.tls_policy)?),
        _ => None,
    };

    debug!("Opening transport to {}{}", url.host_str().unwrap_or_default(), url.path());

    let (ws_stream, _response) =
        connect_async_tls_with_config(request, None, false, connector).await?;
    let (write, mut read) = ws_stream.split();

    let handshake = read_open_packet(&mut read).await?;
    info!(
        "Transport open (sid {}, ping interval {}ms, ping timeout {}ms)",
        handshake.sid, handshake.ping_interval, handshake.ping_timeout
    );

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (closed_tx, closed_rx) = watch::channel(false);

    let handshake = Arc::new(handshake);
    let driver = Driver {
        write,
        read,
        outbound: outbound_rx,
        events: events_tx,
        liveness_window: handshake.liveness_window(),
    };

    TokioSpawn(async move {
        let reason = driver.run().await;
        let _ = closed_tx.send(true);
        reason
    });

    Ok((
        TransportHandle {
            outbound: outbound_tx,
            closing: Arc::new(AtomicBool::new(false)),
            closed: closed_rx,
            handshake,
        },
        TransportEvents { rx: events_rx },
    ))
}

async fn read_open_packet(read: &mut WsRead) -> Result<OpenHandshake, TransportError> {
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                return match Packet::parse(text.as_str())? {
                    Packet::Open(handshake) => Ok(handshake),
                    other => Err(TransportError::handshake(format!(
                        "Expected open packet, received {other:?}"
                    ))),
                };
            }
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => {
                return Err(TransportError::handshake(
                    "Connection closed before the open packet",
                ));
            }
            Some(Ok(other)) => {
                return Err(TransportError::handshake(format!(
                    "Expected open packet, received non-text frame ({} bytes)",
                    other.len()
                )));
            }
            Some(Err(e)) => return Err(TransportError::from(e)),
        }
    }
}

struct Driver {
    write: WsWrite,
    read: WsRead,
    outbound: mpsc::UnboundedReceiver<Outbound>,
    events: mpsc::UnboundedSender<TransportEvent>,
    liveness_window: std::time::Duration,
}

impl Driver {
    async fn run(mut self) -> CloseReason {
        let deadline = sleep(self.liveness_window);
        tokio::pin!(deadline);

        let reason = loop {
            tokio::select! {
                outbound = self.outbound.recv() => {
                    match outbound {
                        Some(Outbound::Packet(packet)) => {
                            if let Err(e) = self.write.send(Message::text(packet.encode())).await {
                                break CloseReason::Error(e.to_string());
                            }
                        }
                        Some(Outbound::Close) | None => {
                            let _ = self.write.send(Message::text(Packet::Close.encode())).await;
                            let _ = self.write.close().await;
                            break CloseReason::ClientRequested;
                        }
                    }
                }
                inbound = self.read.next() => {
                    deadline.as_mut().reset(Instant::now() + self.liveness_window);
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reason) = self.handle_packet(text.as_str()).await {
                                break reason;
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            self.emit(TransportEvent::Message(WireMessage::Binary(data.to_vec())));
                        }
                        Some(Ok(Message::Close(_))) => break CloseReason::ServerClosed,
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("Transport read failed: {e}");
                            break CloseReason::Error(e.to_string());
                        }
                        None => break CloseReason::ConnectionLost,
                    }
                }
                _ = &mut deadline => {
                    warn!("No packet within {:?}, closing transport", self.liveness_window);
                    let _ = self.write.close().await;
                    break CloseReason::PingTimeout;
                }
            }
        };

        info!("Transport closed: {reason}");
        self.emit(TransportEvent::Closed(reason.clone()));
        reason
    }

    /// Returns a close reason when the packet ends the session.
    async fn handle_packet(&mut self, frame: &str) -> Option<CloseReason> {
        let packet = match Packet::parse(frame) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Ignoring frame: {e}");
                return None;
            }
        };

        match packet {
            Packet::Message(payload) => {
                self.emit(TransportEvent::Message(WireMessage::Text(payload)));
                None
            }
            Packet::Ping(payload) => {
                trace!("Ping received, sending pong");
                let pong = Message::text(Packet::Pong(payload).encode());
                match self.write.send(pong).await {
                    Ok(()) => None,
                    Err(e) => Some(CloseReason::Error(e.to_string())),
                }
            }
            Packet::Close => Some(CloseReason::ServerClosed),
            Packet::Pong(_) | Packet::Noop | Packet::Upgrade => None,
            Packet::Open(_) => {
                warn!("Ignoring repeated open packet");
                None
            }
        }
    }

    fn emit(&self, event: TransportEvent) {
        // Nobody listening is fine; the socket is still serviced until closed.
        let _ = self.events.send(event);
    }
}
