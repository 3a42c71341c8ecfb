//! Client side of the test RPC dialect served by [`super::endpoint_server`].

use endpoint_client::bridge::{OutboundSink, RpcMessage};
use endpoint_client::error::RpcError;
use endpoint_client::rpc::{InfoComponent, Managers, PluginRuntime, RpcEngine, SystemManager};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::sync::oneshot;

type Reply = Result<Value, String>;

pub struct FakeEngine {
    outbound: OutboundSink,
    next_id: AtomicU64,
    pending: Mutex<HashMap<String, oneshot::Sender<Reply>>>,
    received: Mutex<Vec<RpcMessage>>,
}

impl FakeEngine {
    fn new(outbound: OutboundSink) -> Self {
        Self {
            outbound,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Send a request of `kind` and wait for the matching result or error.
    pub async fn call(&self, kind: &str, extra: &[(&str, Value)]) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();

        let mut fields = Map::new();
        fields.insert(String::from("type"), Value::from(kind));
        fields.insert(String::from("id"), Value::from(id.clone()));
        for (key, value) in extra {
            fields.insert((*key).to_string(), value.clone());
        }

        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        self.outbound
            .send(&RpcMessage::new(fields))
            .map_err(|e| RpcError::engine(e.to_string()))?;

        match rx.await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(RpcError::remote(message)),
            Err(_) => Err(RpcError::engine("Engine dropped the pending call")),
        }
    }

    /// Every message delivered to the engine, in delivery order.
    pub fn received(&self) -> Vec<RpcMessage> {
        self.received.lock().unwrap().clone()
    }
}

impl RpcEngine for FakeEngine {
    type Param = Value;

    fn handle_message(&self, message: RpcMessage) {
        self.received.lock().unwrap().push(message.clone());

        let Some(id) = message.get("id").and_then(Value::as_str) else {
            return;
        };
        let Some(tx) = self.pending.lock().unwrap().remove(id) else {
            return;
        };

        let reply = match message.get("type").and_then(Value::as_str) {
            Some("result") => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
            _ => Err(message
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("remote error")
                .to_string()),
        };
        let _ = tx.send(reply);
    }

    async fn get_param(&self, name: &str) -> Result<Value, RpcError> {
        self.call("param", &[("param", Value::from(name))]).await
    }
}

pub struct FakeInfo {
    engine: Arc<FakeEngine>,
}

impl InfoComponent for FakeInfo {
    async fn get_version(&self) -> Result<String, RpcError> {
        let version = self.engine.call("version", &[]).await?;
        version
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::remote("Version is not a string"))
    }
}

pub struct FakeSystemManager {
    pub name: String,
    engine: Arc<FakeEngine>,
}

impl SystemManager for FakeSystemManager {
    type Component = FakeInfo;

    async fn get_component(&self, name: &str) -> Result<FakeInfo, RpcError> {
        if name != "info" {
            return Err(RpcError::unavailable(format!("No component named {name}")));
        }
        Ok(FakeInfo {
            engine: Arc::clone(&self.engine),
        })
    }
}

/// Remote manager stand-in carrying the name the server assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteHandle(pub String);

/// Records how engines were constructed.
#[derive(Default)]
pub struct FakeRuntime {
    created: Mutex<Vec<(String, String)>>,
}

impl FakeRuntime {
    /// `(client_name, routing_tag)` for every engine built so far.
    pub fn created_engines(&self) -> Vec<(String, String)> {
        self.created.lock().unwrap().clone()
    }
}

impl PluginRuntime for FakeRuntime {
    type Engine = FakeEngine;
    type SystemManager = FakeSystemManager;
    type DeviceManager = RemoteHandle;
    type EndpointManager = RemoteHandle;
    type MediaManager = RemoteHandle;

    fn create_engine(
        &self,
        client_name: &str,
        routing_tag: &str,
        outbound: OutboundSink,
    ) -> Result<FakeEngine, RpcError> {
        self.created
            .lock()
            .unwrap()
            .push((client_name.to_string(), routing_tag.to_string()));
        Ok(FakeEngine::new(outbound))
    }

    async fn attach(&self, engine: &Arc<FakeEngine>) -> Result<Managers<Self>, RpcError> {
        let result = engine.call("attach", &[]).await?;
        let name = |key: &str| {
            result
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Managers {
            system_manager: FakeSystemManager {
                name: name("systemManager"),
                engine: Arc::clone(engine),
            },
            device_manager: RemoteHandle(name("deviceManager")),
            endpoint_manager: RemoteHandle(name("endpointManager")),
            media_manager: RemoteHandle(name("mediaManager")),
        })
    }
}
