//! JSON-RPC 2.0 over a single WebSocket.
//!
//! One reader task owns the receive half and routes every inbound frame:
//! replies go to the request waiting on that id, notifications go to the
//! subscription they name. Requests share the send half behind a mutex.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::RpcError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A live subscription: the node's id for it and its notification payloads.
#[derive(Debug)]
pub struct Subscription {
    pub id: String,
    pub notifications: mpsc::UnboundedReceiver<Value>,
}

enum Pending {
    Call(oneshot::Sender<Result<Value, RpcError>>),
    Subscribe(oneshot::Sender<Result<Subscription, RpcError>>),
}

impl Pending {
    fn fail(self, error: RpcError) {
        match self {
            Self::Call(tx) => {
                let _ = tx.send(Err(error));
            }
            Self::Subscribe(tx) => {
                let _ = tx.send(Err(error));
            }
        }
    }
}

#[derive(Default)]
struct Router {
    pending: HashMap<u64, Pending>,
    subscriptions: HashMap<String, mpsc::UnboundedSender<Value>>,
    closed: bool,
}

impl Router {
    /// Route one inbound frame.
    fn dispatch(&mut self, frame: Value) {
        if let Some(id) = frame.get("id").and_then(Value::as_u64) {
            let Some(pending) = self.pending.remove(&id) else {
                trace!(id, "reply to an unknown request");
                return;
            };
            let result = reply_result(&frame);
            match pending {
                Pending::Call(tx) => {
                    let _ = tx.send(result);
                }
                Pending::Subscribe(tx) => {
                    let subscription = match result.and_then(|v| subscription_key(&v)) {
                        Ok(id) => {
                            let (sender, notifications) = mpsc::unbounded_channel();
                            self.subscriptions.insert(id.clone(), sender);
                            Ok(Subscription { id, notifications })
                        }
                        Err(e) => Err(e),
                    };
                    let _ = tx.send(subscription);
                }
            }
            return;
        }

        let Some(params) = frame.get("params") else {
            trace!("frame is neither a reply nor a notification");
            return;
        };
        let Some(key) = params.get("subscription").and_then(|v| subscription_key(v).ok()) else {
            return;
        };
        let payload = params.get("result").cloned().unwrap_or(Value::Null);
        let delivered = self
            .subscriptions
            .get(&key)
            .map(|sink| sink.send(payload).is_ok());
        match delivered {
            Some(true) => {}
            Some(false) => {
                // The subscriber went away.
                self.subscriptions.remove(&key);
            }
            None => trace!(subscription = %key, "notification for an unknown subscription"),
        }
    }

    fn shut(&mut self) {
        self.closed = true;
        for (_, pending) in self.pending.drain() {
            pending.fail(RpcError::Closed);
        }
        self.subscriptions.clear();
    }
}

fn reply_result(frame: &Value) -> Result<Value, RpcError> {
    if let Some(error) = frame.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let mut message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        if let Some(data) = error.get("data").and_then(Value::as_str) {
            message = format!("{message}: {data}");
        }
        return Err(RpcError::Node { code, message });
    }
    frame
        .get("result")
        .cloned()
        .ok_or_else(|| RpcError::Malformed("reply carries neither result nor error".into()))
}

/// Subscription ids arrive as strings from Substrate and as numbers from
/// some proxies.
fn subscription_key(value: &Value) -> Result<String, RpcError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(RpcError::Malformed(format!("subscription id {other}"))),
    }
}

fn lock(router: &Mutex<Router>) -> MutexGuard<'_, Router> {
    router.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct RpcClient {
    endpoint: String,
    sink: tokio::sync::Mutex<WsSink>,
    router: Arc<Mutex<Router>>,
    next_id: AtomicU64,
    connected: Arc<AtomicBool>,
    request_timeout: Duration,
    reader: JoinHandle<()>,
}

impl RpcClient {
    /// Perform the WebSocket handshake and start routing replies.
    pub async fn connect(endpoint: &str, request_timeout: Duration) -> Result<Self, RpcError> {
        let (stream, _) = tokio_tungstenite::connect_async(endpoint)
            .await
            .map_err(|e| RpcError::Connect {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        let (sink, source) = stream.split();

        let router = Arc::new(Mutex::new(Router::default()));
        let connected = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(read_loop(
            endpoint.to_string(),
            source,
            Arc::clone(&router),
            Arc::clone(&connected),
        ));
        debug!(endpoint, "websocket connected");

        Ok(Self {
            endpoint: endpoint.to_string(),
            sink: tokio::sync::Mutex::new(sink),
            router,
            next_id: AtomicU64::new(1),
            connected,
            request_timeout,
            reader,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let (tx, rx) = oneshot::channel();
        let id = self.send(method, params, Pending::Call(tx)).await?;
        self.await_reply(id, method, rx).await
    }

    /// Call a `*_subscribe`-style method and start receiving its notifications.
    pub async fn subscribe(&self, method: &str, params: Value) -> Result<Subscription, RpcError> {
        let (tx, rx) = oneshot::channel();
        let id = self.send(method, params, Pending::Subscribe(tx)).await?;
        self.await_reply(id, method, rx).await
    }

    /// Close the socket. Outstanding requests fail with [`RpcError::Closed`].
    pub async fn close(&self) {
        if let Err(e) = self.sink.lock().await.close().await {
            trace!(endpoint = %self.endpoint, error = %e, "close frame not sent");
        }
        self.reader.abort();
        self.connected.store(false, Ordering::SeqCst);
        lock(&self.router).shut();
        debug!(endpoint = %self.endpoint, "websocket closed");
    }

    async fn send(&self, method: &str, params: Value, pending: Pending) -> Result<u64, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut router = lock(&self.router);
            if router.closed {
                return Err(RpcError::Closed);
            }
            router.pending.insert(id, pending);
        }

        let frame = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        trace!(endpoint = %self.endpoint, id, method, "rpc request");
        let sent = self
            .sink
            .lock()
            .await
            .send(Message::Text(frame.to_string()))
            .await;
        if let Err(e) = sent {
            debug!(endpoint = %self.endpoint, method, error = %e, "rpc send failed");
            lock(&self.router).pending.remove(&id);
            return Err(RpcError::Closed);
        }
        Ok(id)
    }

    async fn await_reply<T>(
        &self,
        id: u64,
        method: &str,
        rx: oneshot::Receiver<Result<T, RpcError>>,
    ) -> Result<T, RpcError> {
        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(RpcError::Closed),
            Err(_) => {
                lock(&self.router).pending.remove(&id);
                Err(RpcError::Timeout {
                    method: method.to_string(),
                })
            }
        }
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop(
    endpoint: String,
    mut source: SplitStream<WsStream>,
    router: Arc<Mutex<Router>>,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = source.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(value) => lock(&router).dispatch(value),
                Err(e) => warn!(endpoint = %endpoint, error = %e, "unparseable rpc frame"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(endpoint = %endpoint, error = %e, "websocket read failed");
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
    lock(&router).shut();
    debug!(endpoint = %endpoint, "websocket reader stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(router: &mut Router, id: u64) -> oneshot::Receiver<Result<Value, RpcError>> {
        let (tx, rx) = oneshot::channel();
        router.pending.insert(id, Pending::Call(tx));
        rx
    }

    #[test]
    fn replies_reach_their_request() {
        let mut router = Router::default();
        let mut first = call(&mut router, 1);
        let mut second = call(&mut router, 2);

        router.dispatch(json!({"jsonrpc": "2.0", "id": 2, "result": "0x00"}));
        router.dispatch(json!({"jsonrpc": "2.0", "id": 1, "result": null}));

        assert_eq!(first.try_recv().unwrap().unwrap(), Value::Null);
        assert_eq!(second.try_recv().unwrap().unwrap(), json!("0x00"));
        assert!(router.pending.is_empty());
    }

    #[test]
    fn node_error_includes_data() {
        let mut router = Router::default();
        let mut rx = call(&mut router, 7);
        router.dispatch(json!({
            "jsonrpc": "2.0",
            "id": 7,
            "error": {
                "code": 1010,
                "message": "Invalid Transaction",
                "data": "Inability to pay some fees (e.g. account balance too low)"
            }
        }));
        match rx.try_recv().unwrap() {
            Err(RpcError::Node { code, message }) => {
                assert_eq!(code, 1010);
                assert!(message.contains("balance too low"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn subscription_receives_notifications() {
        let mut router = Router::default();
        let (tx, mut rx) = oneshot::channel();
        router.pending.insert(3, Pending::Subscribe(tx));

        router.dispatch(json!({"jsonrpc": "2.0", "id": 3, "result": "sub-a"}));
        let mut subscription = rx.try_recv().unwrap().unwrap();
        assert_eq!(subscription.id, "sub-a");

        router.dispatch(json!({
            "jsonrpc": "2.0",
            "method": "author_extrinsicUpdate",
            "params": {"subscription": "sub-a", "result": "ready"}
        }));
        router.dispatch(json!({
            "jsonrpc": "2.0",
            "method": "author_extrinsicUpdate",
            "params": {"subscription": "sub-b", "result": "ignored"}
        }));
        assert_eq!(subscription.notifications.try_recv().unwrap(), json!("ready"));
        assert!(subscription.notifications.try_recv().is_err());
    }

    #[test]
    fn dropped_subscriber_is_forgotten() {
        let mut router = Router::default();
        let (tx, mut rx) = oneshot::channel();
        router.pending.insert(1, Pending::Subscribe(tx));
        router.dispatch(json!({"jsonrpc": "2.0", "id": 1, "result": 42}));
        drop(rx.try_recv().unwrap().unwrap());

        router.dispatch(json!({"method": "x", "params": {"subscription": 42, "result": 1}}));
        assert!(router.subscriptions.is_empty());
    }

    #[test]
    fn shut_fails_everything_outstanding() {
        let mut router = Router::default();
        let mut rx = call(&mut router, 1);
        router.shut();
        assert_eq!(rx.try_recv().unwrap(), Err(RpcError::Closed));
        assert!(router.closed);
    }

    #[test]
    fn reply_without_result_is_malformed() {
        assert!(matches!(
            reply_result(&json!({"id": 1})),
            Err(RpcError::Malformed(_))
        ));
    }
}
