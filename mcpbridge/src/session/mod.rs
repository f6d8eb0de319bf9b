//! Session lifecycle: connect, discover, serve invocations, disconnect.
//!
//! A [`Session`] is the one shared connection to the remote tool source. It moves
//! through [`SessionState`] `Disconnected → Connecting → Ready → Closing → Closed`
//! and only serves calls while Ready. Calls are queued on a semaphore
//! (`max_in_flight`, default 1) and bounded by `call_timeout`.
//!
//! [`SessionManager`] owns the lifecycle: one `connect` (handshake + atomic
//! discovery into a [`ToolRegistry`]) and one idempotent `disconnect`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::tool_source::{ToolCallContent, ToolSource, ToolSourceError};
use crate::tools::{InvocationRequest, ToolRegistry};

/// Lifecycle state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Disconnected = 0,
    Connecting = 1,
    Ready = 2,
    Closing = 3,
    Closed = 4,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Disconnected,
            1 => Self::Connecting,
            2 => Self::Ready,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Concurrent calls allowed on the connection; further calls wait in FIFO order.
    pub max_in_flight: usize,
    /// Bound on one call, queueing included.
    pub call_timeout: Duration,
    /// How long `disconnect` waits for in-flight calls before closing the transport.
    pub drain_timeout: Duration,
    /// Bound on the whole `tools/list` walk during `connect`.
    pub discovery_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 1,
            call_timeout: Duration::from_secs(60),
            drain_timeout: Duration::from_secs(5),
            discovery_timeout: Duration::from_secs(60),
        }
    }
}

impl SessionConfig {
    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n.max(1);
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }
}

/// Live connection to the remote tool source.
pub struct Session {
    state: AtomicU8,
    source: Mutex<Option<Arc<dyn ToolSource>>>,
    permits: Semaphore,
    config: SessionConfig,
}

impl Session {
    fn new(config: SessionConfig) -> Arc<Self> {
        let config = SessionConfig {
            max_in_flight: config.max_in_flight.max(1),
            ..config
        };
        Arc::new(Self {
            state: AtomicU8::new(SessionState::Disconnected as u8),
            source: Mutex::new(None),
            permits: Semaphore::new(config.max_in_flight),
            config,
        })
    }

    /// Session that is already Ready over `source`, skipping the handshake.
    pub fn ready(source: Arc<dyn ToolSource>, config: SessionConfig) -> Arc<Self> {
        let session = Self::new(config);
        session.attach(source);
        session.set_state(SessionState::Ready);
        session
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    fn attach(&self, source: Arc<dyn ToolSource>) {
        if let Ok(mut slot) = self.source.lock() {
            *slot = Some(source);
        }
    }

    fn current_source(&self) -> Option<Arc<dyn ToolSource>> {
        self.source.lock().ok().and_then(|s| s.clone())
    }

    fn not_ready(&self) -> ToolSourceError {
        ToolSourceError::NotReady(self.state().to_string())
    }

    /// Transport gone: no further calls, wake everyone queued.
    fn mark_lost(&self, reason: &str) {
        let prev = self.state.swap(SessionState::Closed as u8, Ordering::AcqRel);
        if SessionState::from_u8(prev) == SessionState::Ready {
            tracing::warn!(reason = %reason, "tool source connection lost; session closed");
        }
        self.permits.close();
    }

    /// Issues one call through the connection.
    ///
    /// Rejects immediately unless Ready. Waits for a permit when the connection
    /// is busy. Dropping the returned future releases the permit.
    pub async fn call(&self, request: &InvocationRequest) -> Result<ToolCallContent, ToolSourceError> {
        if !self.is_ready() {
            return Err(self.not_ready());
        }
        let timeout = self.config.call_timeout;
        let attempt = async {
            let _permit = self.permits.acquire().await.map_err(|_| self.not_ready())?;
            if !self.is_ready() {
                return Err(self.not_ready());
            }
            let source = self.current_source().ok_or_else(|| self.not_ready())?;
            source
                .call_tool(&request.tool_name, request.arguments_value())
                .await
        };
        let result = match tokio::time::timeout(timeout, attempt).await {
            Ok(r) => r,
            Err(_) => Err(ToolSourceError::Timeout(timeout)),
        };
        if let Err(ToolSourceError::Disconnected(reason)) = &result {
            self.mark_lost(reason);
        }
        result
    }

    /// Ready → Closing → drain → close transport → Closed. Idempotent.
    async fn close(&self) {
        let prev = SessionState::from_u8(self.state.swap(SessionState::Closing as u8, Ordering::AcqRel));
        if prev == SessionState::Closing {
            // Another close is running.
            return;
        }
        if prev == SessionState::Ready {
            let all = self.config.max_in_flight as u32;
            match tokio::time::timeout(self.config.drain_timeout, self.permits.acquire_many(all)).await {
                Ok(_) => {}
                Err(_) => tracing::warn!(
                    timeout = ?self.config.drain_timeout,
                    "in-flight tool calls did not finish; closing anyway"
                ),
            }
        }
        self.permits.close();
        let source = self.source.lock().ok().and_then(|mut s| s.take());
        if let Some(source) = source {
            if let Err(e) = source.close().await {
                tracing::warn!(error = %e, "error closing tool source");
            }
        }
        self.set_state(SessionState::Closed);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state())
            .field("config", &self.config)
            .finish()
    }
}

/// Opens a transport to a tool source and completes its handshake.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ToolSource>, ToolSourceError>;

    /// Target shown in logs and errors.
    fn describe(&self) -> String;
}

/// An already-open source connects to itself.
#[async_trait]
impl<T: ToolSource + 'static> Connector for Arc<T> {
    async fn connect(&self) -> Result<Arc<dyn ToolSource>, ToolSourceError> {
        Ok(Arc::clone(self) as Arc<dyn ToolSource>)
    }

    fn describe(&self) -> String {
        std::any::type_name::<T>().to_string()
    }
}

/// Startup failures.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: ToolSourceError,
    },
    #[error("tool discovery failed: {0}")]
    Discovery(String),
    #[error("session manager already connected")]
    AlreadyConnected,
}

/// Owns the one session of a run.
#[derive(Debug, Default)]
pub struct SessionManager {
    config: SessionConfig,
    session: Option<Arc<Session>>,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    /// Connects, lists every tool and builds the registry.
    ///
    /// On any failure the transport is closed and the session ends Closed;
    /// nothing is retried.
    pub async fn connect(
        &mut self,
        connector: &dyn Connector,
    ) -> Result<(Arc<Session>, Arc<ToolRegistry>), SessionError> {
        if self.session.is_some() {
            return Err(SessionError::AlreadyConnected);
        }
        let session = Session::new(self.config.clone());
        self.session = Some(Arc::clone(&session));
        session.set_state(SessionState::Connecting);
        let target = connector.describe();
        tracing::debug!(target = %target, "connecting to tool source");

        let source = match connector.connect().await {
            Ok(s) => s,
            Err(source) => {
                session.set_state(SessionState::Closed);
                return Err(SessionError::Connection { target, source });
            }
        };
        session.attach(Arc::clone(&source));

        let limit = self.config.discovery_timeout;
        let registry = match tokio::time::timeout(limit, source.list_tools()).await {
            Ok(Ok(specs)) => ToolRegistry::from_specs(specs, &session)
                .map_err(|e| SessionError::Discovery(e.to_string())),
            Ok(Err(e)) => Err(SessionError::Discovery(e.to_string())),
            Err(_) => Err(SessionError::Discovery(ToolSourceError::Timeout(limit).to_string())),
        };
        let registry = match registry {
            Ok(r) => Arc::new(r),
            Err(e) => {
                session.close().await;
                return Err(e);
            }
        };

        session.set_state(SessionState::Ready);
        tracing::info!(target = %target, tools = registry.len(), "tool source session ready");
        Ok((session, registry))
    }

    /// Graceful teardown. Safe to call more than once or without a session.
    pub async fn disconnect(&self) {
        if let Some(session) = &self.session {
            session.close().await;
            tracing::info!("tool source session closed");
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(s) = &self.session {
            if s.is_ready() {
                tracing::warn!("session manager dropped while session still ready; call disconnect()");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool_source::{MockToolBehavior, MockToolSource};
    use serde_json::json;

    fn req(name: &str) -> InvocationRequest {
        InvocationRequest::new(name, json!({})).unwrap()
    }

    /// **Scenario**: connect publishes a Ready session and one adapter per tool.
    #[tokio::test]
    async fn connect_discovers_tools_and_becomes_ready() {
        let mock = Arc::new(MockToolSource::products_example());
        let mut mgr = SessionManager::default();
        let (session, registry) = mgr.connect(&mock).await.unwrap();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(registry.len(), 2);
        mgr.disconnect().await;
        assert_eq!(session.state(), SessionState::Closed);
        assert!(mock.is_closed());
    }

    #[tokio::test]
    async fn second_connect_is_rejected() {
        let mock = Arc::new(MockToolSource::default());
        let mut mgr = SessionManager::default();
        mgr.connect(&mock).await.unwrap();
        assert!(matches!(mgr.connect(&mock).await, Err(SessionError::AlreadyConnected)));
        mgr.disconnect().await;
    }

    /// **Scenario**: discovery failure closes the transport and publishes nothing.
    #[tokio::test]
    async fn discovery_failure_closes_source() {
        let mock = Arc::new(MockToolSource::default().with_list_error("boom"));
        let mut mgr = SessionManager::default();
        let err = mgr.connect(&mock).await.unwrap_err();
        assert!(matches!(err, SessionError::Discovery(_)));
        assert!(mock.is_closed());
        assert_eq!(mgr.session().unwrap().state(), SessionState::Closed);
    }

    /// **Scenario**: a source that never finishes tools/list fails discovery with a timeout
    /// instead of hanging startup, and the transport is closed.
    #[tokio::test]
    async fn stalled_discovery_times_out() {
        let mock = Arc::new(MockToolSource::products_example().with_list_delay(Duration::from_secs(30)));
        let config = SessionConfig::default().with_discovery_timeout(Duration::from_millis(50));
        let mut mgr = SessionManager::new(config);
        let err = tokio::time::timeout(Duration::from_secs(2), mgr.connect(&mock))
            .await
            .expect("connect must give up on its own")
            .unwrap_err();
        match err {
            SessionError::Discovery(reason) => assert!(reason.contains("timed out"), "{}", reason),
            other => panic!("expected Discovery, got {:?}", other),
        }
        assert!(mock.is_closed());
        assert_eq!(mgr.session().unwrap().state(), SessionState::Closed);
    }

    /// **Scenario**: calls after disconnect fail immediately with NotReady.
    #[tokio::test]
    async fn call_after_close_is_rejected() {
        let session = Session::ready(Arc::new(MockToolSource::default()), SessionConfig::default());
        session.close().await;
        let err = session.call(&req("get_time")).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::NotReady(s) if s == "closed"));
    }

    #[tokio::test]
    async fn disconnect_is_idempotent() {
        let mock = Arc::new(MockToolSource::default());
        let mut mgr = SessionManager::default();
        mgr.connect(&mock).await.unwrap();
        mgr.disconnect().await;
        mgr.disconnect().await;
        assert_eq!(mgr.session().unwrap().state(), SessionState::Closed);
    }

    /// **Scenario**: a dropped transport moves the session to Closed.
    #[tokio::test]
    async fn disconnected_error_closes_session() {
        let mock = MockToolSource::default().with_behavior("get_time", MockToolBehavior::Disconnect);
        let session = Session::ready(Arc::new(mock), SessionConfig::default());
        let err = session.call(&req("get_time")).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::Disconnected(_)));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn slow_call_times_out() {
        let mock = MockToolSource::default().with_behavior(
            "get_time",
            MockToolBehavior::Slow(Duration::from_secs(5), "late".into()),
        );
        let config = SessionConfig::default().with_call_timeout(Duration::from_millis(20));
        let session = Session::ready(Arc::new(mock), config);
        let err = session.call(&req("get_time")).await.unwrap_err();
        assert!(matches!(err, ToolSourceError::Timeout(_)));
        assert!(session.is_ready());
    }

    /// **Scenario**: concurrent callers are queued; at most one call reaches the source at a time.
    #[tokio::test]
    async fn calls_are_serialized_by_default() {
        let mock = Arc::new(MockToolSource::default().with_behavior(
            "get_time",
            MockToolBehavior::Slow(Duration::from_millis(20), "t".into()),
        ));
        let session = Session::ready(mock.clone(), SessionConfig::default());
        let r = req("get_time");
        let (a, b, c) = tokio::join!(session.call(&r), session.call(&r), session.call(&r));
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(mock.peak_in_flight(), 1);
        assert_eq!(mock.calls().len(), 3);
    }

    /// **Scenario**: disconnect does not wait forever on a stuck call.
    #[tokio::test]
    async fn close_gives_up_after_drain_timeout() {
        let mock = MockToolSource::default().with_behavior(
            "get_time",
            MockToolBehavior::Slow(Duration::from_secs(30), "never".into()),
        );
        let config = SessionConfig::default().with_drain_timeout(Duration::from_millis(20));
        let session = Session::ready(Arc::new(mock), config);
        let s2 = Arc::clone(&session);
        let stuck = tokio::spawn(async move { s2.call(&req("get_time")).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        tokio::time::timeout(Duration::from_secs(2), session.close())
            .await
            .expect("close must not hang");
        assert_eq!(session.state(), SessionState::Closed);
        stuck.abort();
    }
}
