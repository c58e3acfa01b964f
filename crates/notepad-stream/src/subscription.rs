use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::StreamExt as _;
use reqwest::Url;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::errors::{ErrorSignal, StreamError, TransportError};
use crate::event::StreamEvent;
use crate::handlers::StreamHandlers;
use crate::options::StreamOptions;
use crate::source::{HttpTransport, StreamTransport};

/// Connection state of a subscription, mirroring `EventSource.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadyState {
    /// Connecting, or waiting to reconnect after an error.
    Connecting,
    /// Connected and receiving frames.
    Open,
    /// Closed by `done`, by cancellation, or by a fatal transport error.
    Closed,
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Entry point for opening notepad subscriptions.
#[derive(Clone)]
pub struct Subscriber {
    config: ClientConfig,
    transport: Arc<dyn StreamTransport>,
}

impl Subscriber {
    /// Creates a subscriber that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config,
            transport: Arc::new(transport),
        })
    }

    /// Creates a subscriber from `NOTEPAD_BASE_URL`.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::new(ClientConfig::from_env())
    }

    /// Creates a subscriber over a custom transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn StreamTransport>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens one subscription and starts dispatching to `handlers`.
    ///
    /// Must be called inside a tokio runtime. The connection stays open until
    /// a `done` event arrives or the subscription is cancelled or dropped;
    /// transient errors are reported to `on_error` and followed by a
    /// reconnect.
    pub fn subscribe(
        &self,
        handlers: StreamHandlers,
        options: &StreamOptions,
    ) -> Result<Subscription, StreamError> {
        let url = self.config.stream_url(options)?;
        let id = uuid::Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (ready_tx, _) = watch::channel(ReadyState::Connecting);
        let inner = Arc::new(SubscriptionInner {
            id,
            closed: AtomicBool::new(false),
            dispatch_gate: Mutex::new(()),
            cancel_tx,
            ready_tx,
        });
        info!(subscription_id = %id, %url, "subscribing to notepad stream");

        let task = tokio::spawn(run_subscription(
            self.transport.clone(),
            url.clone(),
            handlers,
            inner.clone(),
            cancel_rx,
            self.config.retry,
        ));

        Ok(Subscription {
            url,
            handle: CancelHandle { inner },
            task: Some(task),
        })
    }
}

/// Opens a subscription using the environment-derived client configuration.
pub fn subscribe(
    handlers: StreamHandlers,
    options: &StreamOptions,
) -> Result<Subscription, StreamError> {
    Subscriber::from_env()?.subscribe(handlers, options)
}

#[derive(Debug, Clone, Copy)]
enum CloseReason {
    Done,
    Cancelled,
}

thread_local! {
    /// Set while a handler runs on this thread.
    static IN_HANDLER: Cell<bool> = const { Cell::new(false) };
}

struct HandlerScope;

impl HandlerScope {
    fn enter() -> Self {
        IN_HANDLER.with(|flag| flag.set(true));
        HandlerScope
    }
}

impl Drop for HandlerScope {
    fn drop(&mut self) {
        IN_HANDLER.with(|flag| flag.set(false));
    }
}

struct SubscriptionInner {
    id: uuid::Uuid,
    closed: AtomicBool,
    /// Held across the closed check and the handler call, and by `close`.
    dispatch_gate: Mutex<()>,
    cancel_tx: watch::Sender<bool>,
    ready_tx: watch::Sender<ReadyState>,
}

impl SubscriptionInner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closes the connection; only the first call has an effect.
    ///
    /// Waits for a handler running on another thread to return. Called from
    /// inside a handler it does not wait, since that handler is the caller.
    fn close(&self, reason: CloseReason) -> bool {
        let _gate = if IN_HANDLER.with(Cell::get) {
            None
        } else {
            Some(self.lock_gate())
        };
        if self.closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.ready_tx.send_replace(ReadyState::Closed);
        self.cancel_tx.send_replace(true);
        debug!(subscription_id = %self.id, ?reason, "subscription closed");
        true
    }

    fn lock_gate(&self) -> MutexGuard<'_, ()> {
        self.dispatch_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hands `event` to its handler unless the subscription is closed.
    fn dispatch(&self, handlers: &mut StreamHandlers, event: StreamEvent) -> bool {
        let _gate = self.lock_gate();
        if self.is_closed() {
            return false;
        }
        let _scope = HandlerScope::enter();
        handlers.dispatch(event);
        true
    }

    fn set_ready(&self, state: ReadyState) {
        self.ready_tx.send_if_modified(|current| {
            if *current == ReadyState::Closed || *current == state {
                return false;
            }
            *current = state;
            true
        });
    }
}

/// Cloneable handle that closes a subscription.
#[derive(Clone)]
pub struct CancelHandle {
    inner: Arc<SubscriptionInner>,
}

impl CancelHandle {
    /// Closes the connection and stops all further dispatch.
    ///
    /// If a handler is running on another thread, this blocks until it
    /// returns; no handler starts after `cancel` returns.
    ///
    /// Returns `true` if this call closed the subscription and `false` if it
    /// was already closed (by an earlier cancel or by `done`).
    pub fn cancel(&self) -> bool {
        self.inner.close(CloseReason::Cancelled)
    }

    /// Returns true once the subscription was closed by `done` or `cancel`.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// A live subscription.
///
/// Dropping it cancels the connection.
pub struct Subscription {
    url: Url,
    handle: CancelHandle,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn id(&self) -> uuid::Uuid {
        self.handle.inner.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// See [`CancelHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.handle.inner.ready_tx.borrow()
    }

    /// Waits until the ready state becomes `Closed`.
    pub async fn wait_closed(&self) {
        let mut rx = self.handle.inner.ready_tx.subscribe();
        let _ = rx.wait_for(|state| *state == ReadyState::Closed).await;
    }

    /// Waits for the subscription task to exit without cancelling it.
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(subscription_id = %self.id(), error = %err, "subscription task failed");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.cancel();
    }
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|cancelled| *cancelled).await;
}

/// Sleeps for `delay` unless cancellation arrives first; returns false when cancelled.
async fn wait_for_retry(rx: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    tokio::select! {
        _ = cancelled(rx) => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn report_error(
    inner: &SubscriptionInner,
    handlers: &mut StreamHandlers,
    attempt: u32,
    err: &TransportError,
) {
    if inner.is_closed() {
        return;
    }
    warn!(subscription_id = %inner.id, attempt, error = %err, "notepad stream error");
    inner.dispatch(handlers, StreamEvent::Error(ErrorSignal::from(err)));
}

async fn run_subscription(
    transport: Arc<dyn StreamTransport>,
    url: Url,
    mut handlers: StreamHandlers,
    inner: Arc<SubscriptionInner>,
    mut cancel_rx: watch::Receiver<bool>,
    mut retry: Duration,
) {
    let id = inner.id;
    let mut last_event_id: Option<String> = None;
    let mut attempt = 0_u32;

    loop {
        if inner.is_closed() {
            return;
        }
        attempt = attempt.saturating_add(1);
        inner.set_ready(ReadyState::Connecting);
        debug!(subscription_id = %id, attempt, "connecting");

        let connected = tokio::select! {
            _ = cancelled(&mut cancel_rx) => return,
            result = transport.connect(&url, last_event_id.as_deref()) => result,
        };

        let mut frames = match connected {
            Ok(frames) => frames,
            Err(err) => {
                report_error(&inner, &mut handlers, attempt, &err);
                if err.is_fatal() {
                    inner.ready_tx.send_replace(ReadyState::Closed);
                    return;
                }
                if !wait_for_retry(&mut cancel_rx, retry).await {
                    return;
                }
                continue;
            }
        };
        inner.set_ready(ReadyState::Open);

        let failure = loop {
            let next = tokio::select! {
                _ = cancelled(&mut cancel_rx) => return,
                next = frames.next() => next,
            };
            let frame = match next {
                Some(Ok(frame)) => frame,
                Some(Err(err)) => break err,
                None => break TransportError::Ended,
            };
            if let Some(frame_id) = frame.id.as_ref() {
                last_event_id = Some(frame_id.clone());
            }
            if let Some(delay) = frame.retry {
                retry = delay;
            }
            let Some(event) = StreamEvent::from_frame(frame) else {
                continue;
            };
            let done = event.is_done();
            if !inner.dispatch(&mut handlers, event) {
                return;
            }
            if done {
                inner.close(CloseReason::Done);
                return;
            }
        };

        drop(frames);
        report_error(&inner, &mut handlers, attempt, &failure);
        if !wait_for_retry(&mut cancel_rx, retry).await {
            return;
        }
    }
}
