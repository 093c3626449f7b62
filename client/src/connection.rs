//! Connection Manager: one shared, ready chain handle with endpoint failover.
//!
//! The handle slot sits behind an async mutex. A caller that finds a connect
//! already in flight waits on the lock and then reuses whatever handle the
//! first caller stored, so concurrent requests never open two connections.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use forge_protocol::{ChainHandle, ChainTransport, TransportError};
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::metrics::ClientMetrics;
use crate::retry::RetryPolicy;
use crate::{ErrorKind, ForgeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

pub struct ConnectionManager<T: ChainTransport> {
    transport: T,
    endpoints: Vec<String>,
    connect_timeout: Duration,
    ready_timeout: Duration,
    /// Index of the last endpoint that connected; the next sweep starts here.
    current: AtomicUsize,
    handle: Mutex<Option<T::Handle>>,
    state: watch::Sender<ConnectionState>,
    metrics: Option<Arc<ClientMetrics>>,
}

impl<T: ChainTransport> ConnectionManager<T> {
    pub fn new(
        transport: T,
        endpoints: Vec<String>,
        connect_timeout: Duration,
        ready_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            transport,
            endpoints,
            connect_timeout,
            ready_timeout,
            current: AtomicUsize::new(0),
            handle: Mutex::new(None),
            state,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Zero-based index of the endpoint the next sweep starts from.
    pub fn current_endpoint_index(&self) -> usize {
        self.current.load(Ordering::Acquire)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Return the live handle, or sweep the endpoints once to open one.
    ///
    /// Each endpoint is tried at most once per call, starting from the last
    /// one that worked. Individual failures are logged; only the aggregate
    /// `CONNECTION_FAILED` reaches the caller.
    pub async fn connect(&self) -> Result<T::Handle, ForgeError> {
        let mut slot = self.handle.lock().await;
        if let Some(handle) = slot.as_ref() {
            if handle.is_connected() {
                return Ok(handle.clone());
            }
            debug!(endpoint = handle.endpoint(), "dropping dead connection");
        }
        *slot = None;

        self.state.send_replace(ConnectionState::Connecting);
        match self.sweep().await {
            Ok(handle) => {
                *slot = Some(handle.clone());
                self.state.send_replace(ConnectionState::Connected);
                self.set_connected_gauge(1);
                Ok(handle)
            }
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                self.set_connected_gauge(0);
                Err(e)
            }
        }
    }

    /// [`connect`](Self::connect) with whole sweeps retried under `policy`.
    pub async fn connect_with_retry(&self, policy: &RetryPolicy) -> Result<T::Handle, ForgeError> {
        policy.run("connect", || self.connect()).await
    }

    /// Release the handle. The starting endpoint index is kept.
    pub async fn disconnect(&self) {
        let taken = self.handle.lock().await.take();
        if let Some(handle) = taken {
            handle.disconnect().await;
            info!(endpoint = handle.endpoint(), "disconnected");
        }
        self.state.send_replace(ConnectionState::Disconnected);
        self.set_connected_gauge(0);
    }

    async fn sweep(&self) -> Result<T::Handle, ForgeError> {
        let count = self.endpoints.len();
        if count == 0 {
            return Err(ForgeError::new(
                ErrorKind::ConnectionFailed,
                "no endpoints configured",
            ));
        }

        let start = self.current.load(Ordering::Acquire) % count;
        let mut last_error = None;
        for offset in 0..count {
            let index = (start + offset) % count;
            let endpoint = &self.endpoints[index];
            if let Some(m) = &self.metrics {
                m.connect_attempts.inc();
            }
            match self.open(endpoint).await {
                Ok(handle) => {
                    self.current.store(index, Ordering::Release);
                    info!(endpoint = %endpoint, index, "connected");
                    return Ok(handle);
                }
                Err(e) => {
                    if let Some(m) = &self.metrics {
                        m.connect_failures.inc();
                    }
                    warn!(endpoint = %endpoint, index, error = %e, "endpoint unavailable");
                    last_error = Some(e);
                }
            }
        }

        let err = ForgeError::new(
            ErrorKind::ConnectionFailed,
            format!("all {count} endpoints failed"),
        );
        Err(match last_error {
            Some(cause) => err.with_cause(cause),
            None => err,
        })
    }

    async fn open(&self, endpoint: &str) -> Result<T::Handle, TransportError> {
        let handle = timeout(self.connect_timeout, self.transport.connect(endpoint))
            .await
            .map_err(|_| {
                TransportError::Timeout(format!("connect timed out after {:?}", self.connect_timeout))
            })??;

        match timeout(self.ready_timeout, handle.wait_ready()).await {
            Ok(Ok(())) => Ok(handle),
            Ok(Err(e)) => {
                handle.disconnect().await;
                Err(e)
            }
            Err(_) => {
                handle.disconnect().await;
                Err(TransportError::Timeout(format!(
                    "not ready after {:?}",
                    self.ready_timeout
                )))
            }
        }
    }

    fn set_connected_gauge(&self, value: i64) {
        if let Some(m) = &self.metrics {
            m.connected.set(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_nullables::{EndpointBehavior, NullChain, NullTransport};

    const A: &str = "ws://a:9944";
    const B: &str = "ws://b:9944";
    const C: &str = "ws://c:9944";

    fn manager(transport: NullTransport) -> ConnectionManager<NullTransport> {
        ConnectionManager::new(
            transport,
            vec![A.into(), B.into(), C.into()],
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn live_handle_is_reused() {
        let mgr = manager(NullTransport::new(NullChain::new()));
        let first = mgr.connect().await.unwrap();
        let second = mgr.connect().await.unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(mgr.transport().attempts().len(), 1);
        assert_eq!(mgr.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn concurrent_connects_share_one_attempt() {
        let mgr = manager(NullTransport::new(NullChain::new()));
        let (a, b) = tokio::join!(mgr.connect(), mgr.connect());
        assert_eq!(a.unwrap().id(), b.unwrap().id());
        assert_eq!(mgr.transport().attempts(), vec![A]);
    }

    #[tokio::test]
    async fn fails_over_and_remembers_index() {
        let transport =
            NullTransport::new(NullChain::new()).with_behavior(A, EndpointBehavior::Refuse);
        let mgr = manager(transport);

        let handle = mgr.connect().await.unwrap();
        assert_eq!(handle.endpoint(), B);
        assert_eq!(mgr.current_endpoint_index(), 1);

        mgr.disconnect().await;
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert!(!handle.is_connected());

        mgr.connect().await.unwrap();
        assert_eq!(mgr.transport().attempts(), vec![A, B, B]);
        assert_eq!(mgr.current_endpoint_index(), 1);
    }

    #[tokio::test]
    async fn wraps_around_from_remembered_index() {
        let transport =
            NullTransport::new(NullChain::new()).with_behavior(A, EndpointBehavior::Refuse);
        let mgr = manager(transport);
        mgr.connect().await.unwrap();
        mgr.disconnect().await;

        mgr.transport().set_behavior(B, EndpointBehavior::Refuse);
        mgr.transport().set_behavior(C, EndpointBehavior::Refuse);
        mgr.transport().set_behavior(A, EndpointBehavior::Accept);
        let handle = mgr.connect().await.unwrap();
        assert_eq!(handle.endpoint(), A);
        let attempts = mgr.transport().attempts();
        assert_eq!(&attempts[1..], &[B, B, C, A]);
        assert_eq!(mgr.current_endpoint_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_and_unready_endpoints_time_out() {
        let transport = NullTransport::new(NullChain::new())
            .with_behavior(A, EndpointBehavior::Hang)
            .with_behavior(B, EndpointBehavior::NeverReady);
        let mgr = manager(transport);
        let handle = mgr.connect().await.unwrap();
        assert_eq!(handle.endpoint(), C);
        assert_eq!(mgr.current_endpoint_index(), 2);
    }

    #[tokio::test]
    async fn all_endpoints_down() {
        let transport = NullTransport::new(NullChain::new())
            .with_behavior(A, EndpointBehavior::Refuse)
            .with_behavior(B, EndpointBehavior::Refuse)
            .with_behavior(C, EndpointBehavior::Refuse);
        let metrics = Arc::new(ClientMetrics::new());
        let mgr = manager(transport).with_metrics(metrics.clone());

        let err = mgr.connect().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
        assert_eq!(err.message(), "all 3 endpoints failed");
        assert_eq!(mgr.transport().attempts(), vec![A, B, C]);
        assert_eq!(mgr.state(), ConnectionState::Disconnected);
        assert_eq!(metrics.connect_attempts.get(), 3);
        assert_eq!(metrics.connect_failures.get(), 3);
        assert_eq!(metrics.connected.get(), 0);
    }

    #[tokio::test]
    async fn dead_handle_triggers_reconnect() {
        let mgr = manager(NullTransport::new(NullChain::new()));
        let first = mgr.connect().await.unwrap();
        first.disconnect().await;
        let second = mgr.connect().await.unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test(start_paused = true)]
    async fn retried_connect_keeps_connection_failed() {
        let transport = NullTransport::new(NullChain::new())
            .with_behavior(A, EndpointBehavior::Refuse)
            .with_behavior(B, EndpointBehavior::Refuse)
            .with_behavior(C, EndpointBehavior::Refuse);
        let mgr = manager(transport);
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(10),
        };
        let err = mgr.connect_with_retry(&policy).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
        assert_eq!(mgr.transport().attempts().len(), 6);
    }

    #[tokio::test]
    async fn state_changes_are_observable() {
        let mgr = manager(NullTransport::new(NullChain::new()));
        let mut rx = mgr.subscribe();
        mgr.connect().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ConnectionState::Connected);
    }
}
