//! Live-Update Client
//!
//! Keeps one event-stream subscription alive and calls the reload action
//! whenever the server signals fresh data.
//!
//! A subscription runs as a single tokio task that owns the open stream and
//! the retry counter. Reconnects happen inside that task; `start()` and
//! `stop()` abort it and wait for it to finish, so the old stream is dropped
//! before anything new is opened.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use super::backoff::BackoffPolicy;
use super::error::{LiveError, LiveResult};
use super::event::LiveEvent;
use super::state::{ConnectionState, LiveNotice};
use super::transport::{EventStream, HttpTransport, Transport};
use crate::config::Config;

/// Action run when the server signals fresh data
#[async_trait]
pub trait Reload: Send + Sync {
    /// Fetch and publish the current state. Failures are logged by the
    /// caller and never retried.
    async fn reload(&self) -> anyhow::Result<()>;
}

/// [`Reload`] backed by an async closure
pub struct ReloadFn<F>(F);

/// Wrap an async closure as a [`Reload`] action
pub fn reload_fn<F, Fut>(f: F) -> ReloadFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    ReloadFn(f)
}

#[async_trait]
impl<F, Fut> Reload for ReloadFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn reload(&self) -> anyhow::Result<()> {
        (self.0)().await
    }
}

/// Default capacity of the notice channel
pub const DEFAULT_NOTICE_CAPACITY: usize = 64;

/// Client for the server's live-update stream
pub struct LiveClient {
    shared: Arc<Shared>,
    /// Task running the current subscription, if any
    subscription: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    transport: Arc<dyn Transport>,
    reload: Arc<dyn Reload>,
    policy: BackoffPolicy,
    state: watch::Sender<ConnectionState>,
    notices: broadcast::Sender<LiveNotice>,
}

impl LiveClient {
    /// Create a client over the given transport
    pub fn new(transport: Arc<dyn Transport>, reload: Arc<dyn Reload>, policy: BackoffPolicy) -> Self {
        Self::with_capacity(transport, reload, policy, DEFAULT_NOTICE_CAPACITY)
    }

    /// Create a client with a custom notice channel capacity
    pub fn with_capacity(
        transport: Arc<dyn Transport>,
        reload: Arc<dyn Reload>,
        policy: BackoffPolicy,
        notice_capacity: usize,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (notices, _) = broadcast::channel(notice_capacity.max(1));

        Self {
            shared: Arc::new(Shared {
                transport,
                reload,
                policy,
                state,
                notices,
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Create an HTTP-backed client from configuration
    pub fn from_config(config: &Config, reload: Arc<dyn Reload>) -> LiveResult<Self> {
        let transport = HttpTransport::from_config(config)?;
        info!(url = %transport.url(), "Live updates configured");

        Ok(Self::with_capacity(
            Arc::new(transport),
            reload,
            BackoffPolicy::from(&config.live),
            config.live.notice_capacity,
        ))
    }

    /// Open a new subscription, closing the current one first.
    ///
    /// Each call starts with a fresh retry budget.
    pub async fn start(&self) {
        let mut subscription = self.subscription.lock().await;

        if let Some(task) = subscription.take() {
            task.abort();
            let _ = task.await;
            debug!("Previous event stream closed");
        }

        let shared = Arc::clone(&self.shared);
        *subscription = Some(tokio::spawn(run_subscription(shared)));
        info!("Event stream subscription started");
    }

    /// Close the current subscription. Pending reconnects are cancelled.
    pub async fn stop(&self) {
        let mut subscription = self.subscription.lock().await;

        if let Some(task) = subscription.take() {
            let was_running = !task.is_finished();
            task.abort();
            let _ = task.await;

            if was_running {
                self.shared.set_state(ConnectionState::Disconnected);
                self.shared.notify(LiveNotice::Stopped);
                info!("Event stream closed on shutdown");
            }
        }
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Watch connection state changes
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Receive lifecycle notices from now on
    pub fn subscribe(&self) -> broadcast::Receiver<LiveNotice> {
        self.shared.notices.subscribe()
    }

    /// Whether a subscription task is still alive
    pub async fn is_running(&self) -> bool {
        self.subscription
            .lock()
            .await
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }

    /// Backoff policy in use
    pub fn policy(&self) -> &BackoffPolicy {
        &self.shared.policy
    }
}

impl Drop for LiveClient {
    fn drop(&mut self) {
        if let Some(task) = self.subscription.get_mut().take() {
            task.abort();
        }
    }
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }

    fn notify(&self, notice: LiveNotice) {
        // No receivers is fine
        let _ = self.notices.send(notice);
    }

    /// Run the reload action inside the subscription task, so aborting the
    /// subscription also cancels an in-flight reload. Panics are contained.
    async fn reload(&self) {
        let result = AssertUnwindSafe(self.reload.reload()).catch_unwind().await;

        let message = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => format!("{:#}", e),
            Err(panic) => format!("reload panicked: {}", panic_message(panic.as_ref())),
        };

        warn!(error = %message, "Reload failed");
        self.notify(LiveNotice::ReloadFailed { message });
    }

    /// Drive one open stream until it fails or closes
    async fn pump(&self, mut stream: EventStream, attempts: &mut u32) -> LiveError {
        let mut connected = false;

        while let Some(item) = stream.next().await {
            let frame = match item {
                Ok(frame) => frame,
                Err(e) => return e,
            };

            if let Some(retry) = frame.retry {
                debug!(retry_ms = retry, "Server retry hint ignored");
            }

            match LiveEvent::from(frame) {
                LiveEvent::Init => {
                    *attempts = 0;
                    connected = true;
                    info!("Event stream established");
                    self.set_state(ConnectionState::Connected);
                    self.notify(LiveNotice::Connected);
                    self.reload().await;
                }
                LiveEvent::Update { id, .. } => {
                    if !connected {
                        debug!("Update before init ignored");
                        continue;
                    }
                    debug!(id = ?id, "Update event received");
                    self.notify(LiveNotice::Update);
                    self.reload().await;
                }
                LiveEvent::Keepalive => {
                    trace!("Ping event received");
                    self.notify(LiveNotice::Keepalive);
                }
                LiveEvent::Other { event, .. } => {
                    debug!(event = %event, "Ignoring unknown event");
                }
            }
        }

        LiveError::Closed
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

async fn run_subscription(shared: Arc<Shared>) {
    let mut attempts: u32 = 0;

    loop {
        shared.set_state(ConnectionState::Connecting);
        shared.notify(LiveNotice::Connecting);
        debug!(attempt = attempts, "Opening event stream");

        // The stream is dropped (connection closed) before any backoff
        let error = match shared.transport.open().await {
            Ok(stream) => shared.pump(stream, &mut attempts).await,
            Err(e) => e,
        };

        warn!(error = %error, "Event stream error");
        shared.notify(LiveNotice::TransportError {
            message: error.to_string(),
        });

        match shared.policy.next_delay(attempts) {
            Some(delay) => {
                attempts += 1;
                info!(
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnecting in {:.1} seconds",
                    delay.as_secs_f64()
                );
                shared.set_state(ConnectionState::Backoff {
                    attempt: attempts,
                    delay,
                });
                shared.notify(LiveNotice::ReconnectScheduled {
                    attempt: attempts,
                    delay,
                });
                tokio::time::sleep(delay).await;
            }
            None => {
                error!(attempts, "Max reconnect attempts reached. Manual refresh required.");
                shared.set_state(ConnectionState::PermanentlyFailed);
                shared.notify(LiveNotice::GaveUp { attempts });
                return;
            }
        }
    }
}
