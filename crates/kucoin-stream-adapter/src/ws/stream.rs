/*
[INPUT]:  Stream kind, configuration, authenticated client, consumer callback
[OUTPUT]: A supervised streaming session with start/stop lifecycle
[POS]:    WebSocket layer - lifecycle controller and reconnect supervision
[UPDATE]: When changing start/stop semantics or reconnect policy
*/

use crate::error::{KucoinError, Result};
use crate::http::{KucoinClient, OrderSide};
use crate::ws::backoff::ExponentialBackoff;
use crate::ws::session::{SessionExit, run_connection};
use crate::ws::state::{RunState, SessionState};
use crate::ws::subscription::StreamKind;
use futures_util::future::BoxFuture;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, warn};

/// Outcome of one consumer callback invocation
pub type CallbackResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Consumer callback: receives each parsed data message in socket order.
/// May perform asynchronous work; failures are isolated by the dispatch loop.
pub type MessageCallback =
    Arc<dyn Fn(serde_json::Value) -> BoxFuture<'static, CallbackResult> + Send + Sync>;

/// Wrap an async closure into a [`MessageCallback`]
pub fn message_callback<F, Fut>(f: F) -> MessageCallback
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = CallbackResult> + Send + 'static,
{
    Arc::new(move |value| Box::pin(f(value)))
}

/// Reconnection policy applied after a lost connection or a retryable
/// connect failure
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Consecutive failed attempts tolerated before giving up
    pub max_attempts: u32,
    pub delay_initial: Duration,
    pub delay_max: Duration,
    pub backoff_factor: f64,
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay_initial: Duration::from_secs(1),
            delay_max: Duration::from_secs(30),
            backoff_factor: 1.5,
            jitter_ms: 100,
        }
    }
}

/// Streaming session configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub kind: StreamKind,
    /// Keepalive ping cadence
    pub ping_interval: Duration,
    /// Best-effort minimum delay between callback invocations
    pub pacing: Duration,
    /// Bound of the inbound frame queue (backpressure point)
    pub queue_capacity: usize,
    /// Applied to the socket handshake; the token fetch uses the HTTP
    /// client's own timeouts
    pub connect_timeout: Duration,
    pub reconnect: ReconnectConfig,
}

impl StreamConfig {
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            ping_interval: Duration::from_secs(20),
            pacing: Duration::from_millis(50),
            queue_capacity: 100,
            connect_timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
        }
    }
}

/// A supervised streaming session bound to one logical subscription.
///
/// Owns no socket directly; each (re)connect attempt creates a fresh
/// physical connection with a fresh single-use token. Independent sessions
/// share no mutable state and may run on the same or separate runtimes.
pub struct KucoinStream {
    client: KucoinClient,
    config: StreamConfig,
    handle: Handle,
    state: Arc<SessionState>,
    shutdown: watch::Sender<bool>,
}

impl KucoinStream {
    /// Create a stream bound to an explicit runtime handle.
    ///
    /// The handle is the execution context for all session tasks; the
    /// stream never inspects ambient runtime state.
    pub fn new(client: KucoinClient, config: StreamConfig, handle: Handle) -> Self {
        Self {
            client,
            config,
            handle,
            state: Arc::new(SessionState::new()),
            shutdown: watch::Sender::new(false),
        }
    }

    /// Start the connect -> subscribe -> stream pipeline.
    ///
    /// Non-blocking: schedules the session on the runtime handle and
    /// returns once scheduling succeeds, without waiting for the streaming
    /// phase. Missing private credentials fail here, before any socket or
    /// background task exists. A session starts at most once.
    pub fn start(&self, callback: MessageCallback) -> Result<()> {
        if self.config.kind.is_private() && self.client.credentials().is_none() {
            return Err(KucoinError::auth("private stream requires credentials"));
        }
        if *self.shutdown.borrow() {
            return Err(KucoinError::Config("stream already stopped".to_string()));
        }
        if !self.state.transition(RunState::Idle, RunState::Connecting) {
            return Err(KucoinError::Config("stream already started".to_string()));
        }

        let client = self.client.clone();
        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let handle = self.handle.clone();
        let shutdown = self.shutdown.subscribe();
        self.handle.spawn(supervise(client, config, state, callback, handle, shutdown));
        Ok(())
    }

    /// Request cooperative shutdown. Idempotent; in-flight loops observe
    /// the flag at their next suspension point and wind down.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
        // A session that never started has no supervisor to finalize it
        self.state.transition(RunState::Idle, RunState::Stopped);
    }

    /// Wait until the session reaches its terminal state
    pub async fn wait_stopped(&self) {
        let mut rx = self.state.watch();
        while *rx.borrow_and_update() != RunState::Stopped {
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    pub fn run_state(&self) -> RunState {
        self.state.run_state()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Human-readable form of the last session error, if any
    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    /// Remove and return the last session error
    pub fn take_last_error(&self) -> Option<KucoinError> {
        self.state.take_last_error()
    }

    pub fn kind(&self) -> &StreamKind {
        &self.config.kind
    }

    /// Submit a market order on the same authenticated client that backs
    /// this stream. Only meaningful on a private account stream.
    pub async fn submit_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        size: Decimal,
    ) -> Result<String> {
        if !self.config.kind.is_private() {
            return Err(KucoinError::Config(
                "order submission requires a private account stream".to_string(),
            ));
        }
        self.client.create_market_order(symbol, side, size).await
    }

    /// Submit a validate-only market order (test endpoint)
    pub async fn submit_test_market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        size: Decimal,
    ) -> Result<String> {
        if !self.config.kind.is_private() {
            return Err(KucoinError::Config(
                "order submission requires a private account stream".to_string(),
            ));
        }
        self.client.create_test_order(symbol, side, size).await
    }
}

/// Supervisor task: runs connections until a terminal condition.
///
/// Retryable failures reconnect with capped, jittered exponential backoff;
/// a connection that reached the streaming phase resets the retry budget.
/// Auth and callback failures are terminal.
async fn supervise(
    client: KucoinClient,
    config: StreamConfig,
    state: Arc<SessionState>,
    callback: MessageCallback,
    handle: Handle,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut backoff = ExponentialBackoff::new(
        config.reconnect.delay_initial,
        config.reconnect.delay_max,
        config.reconnect.backoff_factor,
        config.reconnect.jitter_ms,
    );
    let mut attempts: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let outcome =
            run_connection(&client, &config, &state, &callback, &handle, &mut shutdown).await;
        let error = match outcome {
            Ok(SessionExit::Stopped) => {
                debug!("session stopped by request");
                break;
            }
            Ok(SessionExit::CallbackFailed(err)) => {
                error!(error = %err, "stopping session after callback failure");
                state.record_error(err);
                break;
            }
            Ok(SessionExit::ConnectionLost(err)) => {
                // Reached streaming before dying: fresh retry budget
                attempts = 0;
                backoff.reset();
                err
            }
            Err(err) => err,
        };

        if error.is_auth_error() || !error.is_retryable() {
            error!(error = %error, "fatal stream error");
            state.record_error(error);
            break;
        }

        attempts += 1;
        if attempts > config.reconnect.max_attempts {
            error!(attempts = attempts - 1, "reconnect attempts exhausted");
            state.record_error(error);
            break;
        }

        let delay = backoff.next_duration();
        warn!(
            error = %error,
            attempt = attempts,
            max_attempts = config.reconnect.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "reconnecting"
        );
        state.record_error(error);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    state.set_run_state(RunState::Stopping);
    state.set_run_state(RunState::Stopped);
}
