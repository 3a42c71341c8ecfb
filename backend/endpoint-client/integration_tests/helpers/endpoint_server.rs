//! A single-connection Engine.IO endpoint for tests.
//!
//! RPC dialect (JSON objects inside Engine.IO message packets):
//! - `{"type":"attach","id"}` → result with the four manager names
//! - `{"type":"param","id","param"}` → result `{"param": <name>, "owner": "user-1"}`
//! - `{"type":"version","id"}` → result string, or an error when no version is configured

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_rustls::TlsAcceptor;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

pub const TEST_SESSION_ID: &str = "test-sid";

#[derive(Debug, Clone)]
pub struct EndpointBehavior {
    /// Refuse the websocket upgrade with 403.
    pub reject_upgrade: bool,
    /// Send the Engine.IO open packet after upgrading.
    pub send_open: bool,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    /// Send a ping right after the open packet.
    pub ping_after_open: bool,
    /// Keep pinging at this period for as long as the connection lives.
    pub ping_period: Option<Duration>,
    /// Close the session instead of answering `attach`.
    pub close_on_attach: bool,
    /// Leave `attach` unanswered.
    pub ignore_attach: bool,
    /// Raw message payloads pushed right after the `attach` result.
    pub pushes_after_attach: Vec<String>,
    /// `None` makes the version call fail.
    pub version: Option<String>,
}

impl Default for EndpointBehavior {
    fn default() -> Self {
        Self {
            reject_upgrade: false,
            send_open: true,
            ping_interval: 25_000,
            ping_timeout: 20_000,
            ping_after_open: false,
            ping_period: None,
            close_on_attach: false,
            ignore_attach: false,
            pushes_after_attach: Vec::new(),
            version: Some(String::from("0.123.4")),
        }
    }
}

/// What the server saw in the upgrade request.
#[derive(Debug, Clone)]
pub struct UpgradeRecord {
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
}

#[derive(Debug)]
pub enum ServerCommand {
    /// Send a message packet with this payload.
    Push(String),
    /// Send a close packet and close the websocket.
    Close,
}

pub struct EndpointServer {
    pub addr: SocketAddr,
    scheme: &'static str,
    pub upgrades: mpsc::UnboundedReceiver<UpgradeRecord>,
    /// Every text frame the client sent, in order.
    pub frames: mpsc::UnboundedReceiver<String>,
    pub commands: mpsc::UnboundedSender<ServerCommand>,
}

impl EndpointServer {
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.addr)
    }

    /// Wait for a client frame equal to `expected`.
    pub async fn expect_frame(&mut self, expected: &str) {
        while let Some(frame) = self.frames.recv().await {
            if frame == expected {
                return;
            }
        }
        panic!("Connection ended before frame {expected:?} arrived");
    }
}

pub async fn spawn_endpoint(behavior: EndpointBehavior) -> EndpointServer {
    start_endpoint(behavior, None).await
}

/// Same endpoint behind TLS with the self-signed test certificate (`https://` base URL).
pub async fn spawn_tls_endpoint(behavior: EndpointBehavior) -> EndpointServer {
    start_endpoint(behavior, Some(super::tls::self_signed_acceptor())).await
}

struct Channels {
    upgrades: mpsc::UnboundedSender<UpgradeRecord>,
    frames: mpsc::UnboundedSender<String>,
    commands: mpsc::UnboundedReceiver<ServerCommand>,
}

async fn start_endpoint(behavior: EndpointBehavior, tls: Option<TlsAcceptor>) -> EndpointServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test endpoint");
    let addr = listener.local_addr().expect("Listener has no address");
    let scheme = if tls.is_some() { "https" } else { "http" };

    let (upgrades_tx, upgrades_rx) = mpsc::unbounded_channel();
    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let channels = Channels {
        upgrades: upgrades_tx,
        frames: frames_tx,
        commands: commands_rx,
    };

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };

        match tls {
            Some(acceptor) => {
                // A client that rejects the certificate aborts here.
                let Ok(stream) = acceptor.accept(stream).await else {
                    return;
                };
                serve(stream, behavior, channels).await;
            }
            None => serve(stream, behavior, channels).await,
        }
    });

    EndpointServer {
        addr,
        scheme,
        upgrades: upgrades_rx,
        frames: frames_rx,
        commands: commands_tx,
    }
}

async fn serve<S>(stream: S, behavior: EndpointBehavior, channels: Channels)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let Channels {
        upgrades: upgrades_tx,
        frames: frames_tx,
        commands: mut commands_rx,
    } = channels;

    let reject = behavior.reject_upgrade;
    let callback = move |request: &Request, response: Response| {
        let _ = upgrades_tx.send(UpgradeRecord {
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            cookie: request
                .headers()
                .get("cookie")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        });

        if reject {
            let mut refusal = ErrorResponse::new(Some(String::from("forbidden")));
            *refusal.status_mut() = StatusCode::FORBIDDEN;
            return Err(refusal);
        }
        Ok(response)
    };

    let Ok(ws) = accept_hdr_async(stream, callback).await else {
        return;
    };
    let (mut write, mut read) = ws.split();

    if !behavior.send_open {
        let _ = write.close().await;
        return;
    }

    let open = json!({
        "sid": TEST_SESSION_ID,
        "upgrades": [],
        "pingInterval": behavior.ping_interval,
        "pingTimeout": behavior.ping_timeout,
        "maxPayload": 1_000_000,
    });
    if write.send(Message::text(format!("0{open}"))).await.is_err() {
        return;
    }
    if behavior.ping_after_open {
        let _ = write.send(Message::text("2")).await;
    }

    let mut pinger = tokio::time::interval(behavior.ping_period.unwrap_or(Duration::from_secs(3600)));

    loop {
        tokio::select! {
            _ = pinger.tick() => {
                if behavior.ping_period.is_some() && write.send(Message::text("2")).await.is_err() {
                    return;
                }
            }
            command = commands_rx.recv() => match command {
                Some(ServerCommand::Push(payload)) => {
                    let _ = write.send(Message::text(format!("4{payload}"))).await;
                }
                Some(ServerCommand::Close) => {
                    let _ = write.send(Message::text("1")).await;
                    let _ = write.close().await;
                    return;
                }
                None => return,
            },
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let text = text.as_str().to_string();
                    let _ = frames_tx.send(text.clone());

                    if text == "1" {
                        return;
                    }
                    let Some(payload) = text.strip_prefix('4') else {
                        continue;
                    };
                    let Ok(request) = serde_json::from_str::<Value>(payload) else {
                        continue;
                    };

                    let id = request["id"].clone();
                    let reply = match request["type"].as_str() {
                        Some("attach") if behavior.close_on_attach => {
                            let _ = write.send(Message::text("1")).await;
                            let _ = write.close().await;
                            return;
                        }
                        Some("attach") if behavior.ignore_attach => continue,
                        Some("attach") => json!({
                            "type": "result",
                            "id": id,
                            "result": {
                                "systemManager": "system",
                                "deviceManager": "device",
                                "endpointManager": "endpoint",
                                "mediaManager": "media",
                            },
                        }),
                        Some("param") => json!({
                            "type": "result",
                            "id": id,
                            "result": { "param": request["param"], "owner": "user-1" },
                        }),
                        Some("version") => match &behavior.version {
                            Some(version) => json!({ "type": "result", "id": id, "result": version }),
                            None => json!({ "type": "error", "id": id, "message": "getVersion failed" }),
                        },
                        _ => continue,
                    };

                    if write.send(Message::text(format!("4{reply}"))).await.is_err() {
                        return;
                    }

                    if request["type"] == "attach" {
                        for push in &behavior.pushes_after_attach {
                            let _ = write.send(Message::text(format!("4{push}"))).await;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            },
        }
    }
}
