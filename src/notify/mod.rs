mod backoff;
mod error;
mod listeners;
mod message;
mod transport;

pub use backoff::{Backoff, ReconnectPolicy};
pub use error::{MessageError, StreamError};
pub use listeners::{Callback, ListenerId, Listeners};
pub use message::{AssignAlert, AssignNotice, NoticeKind, Notification, ReminderNotice};
pub use transport::{CloseCode, Connection, SubscriberKey, TcpLineTransport, Transport};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::observability::*;

/// Connection lifecycle as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting {
        key: SubscriberKey,
        attempt: u32,
    },
    Connected {
        key: SubscriberKey,
    },
    Reconnecting {
        key: SubscriberKey,
        attempt: u32,
        delay: Duration,
    },
    /// Every reconnect attempt failed; nothing happens until the next `connect`.
    Exhausted {
        key: SubscriberKey,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamConfig {
    pub reconnect: ReconnectPolicy,
}

enum Command {
    Connect(SubscriberKey),
    Disconnect,
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the live notification stream.
///
/// One background task owns the single connection and all reconnect timing;
/// handles only send it commands. Listeners live in a shared [`Listeners`] set
/// that survives reconnects, key switches and `disconnect`.
///
/// The task stops on [`shutdown`](Self::shutdown) or once every handle is
/// dropped. A callback that captures a `NotificationStream` keeps a handle
/// alive from inside the task, so such a stream only stops via `shutdown`.
/// Callbacks that only add or remove listeners should capture
/// [`listeners()`](Self::listeners) instead.
#[derive(Clone)]
pub struct NotificationStream {
    commands: mpsc::UnboundedSender<Command>,
    listeners: Listeners,
    state: watch::Receiver<StreamState>,
}

impl NotificationStream {
    /// Start the stream task on the current tokio runtime, initially disconnected.
    pub fn spawn(transport: impl Transport, config: StreamConfig) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(StreamState::Disconnected);
        let listeners = Listeners::new();
        let task = StreamTask {
            transport: Arc::new(transport),
            listeners: listeners.clone(),
            state: state_tx,
            backoff: Backoff::new(config.reconnect),
            key: None,
            conn: None,
            opening: None,
            retry_at: None,
        };
        tokio::spawn(task.run(rx));
        Self {
            commands,
            listeners,
            state,
        }
    }

    fn send(&self, cmd: Command) -> Result<(), StreamError> {
        self.commands.send(cmd).map_err(|_| StreamError::Stopped)
    }

    /// Connect under `key`. A no-op when already connected or connecting under
    /// the same key; otherwise the current connection is closed first and the
    /// attempt counter starts over.
    pub fn connect(&self, key: SubscriberKey) -> Result<(), StreamError> {
        self.send(Command::Connect(key))
    }

    /// Close with a normal-closure code and cancel any pending reconnect.
    /// Registered listeners are kept.
    pub fn disconnect(&self) -> Result<(), StreamError> {
        self.send(Command::Disconnect)
    }

    /// Disconnect and stop the background task.
    pub async fn shutdown(&self) -> Result<(), StreamError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx))?;
        rx.await.map_err(|_| StreamError::Stopped)
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn add_listener<F>(&self, id: impl Into<ListenerId>, callback: F)
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        self.listeners.add(id, callback);
    }

    pub fn remove_listener(&self, id: &ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn state(&self) -> StreamState {
        self.state.borrow().clone()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }
}

type OpenFuture = Pin<Box<dyn Future<Output = Result<Box<dyn Connection>, StreamError>> + Send>>;

struct StreamTask {
    transport: Arc<dyn Transport>,
    listeners: Listeners,
    state: watch::Sender<StreamState>,
    backoff: Backoff,
    key: Option<SubscriberKey>,
    conn: Option<Box<dyn Connection>>,
    opening: Option<OpenFuture>,
    retry_at: Option<Instant>,
}

async fn next_frame(conn: &mut Option<Box<dyn Connection>>) -> Option<Result<String, StreamError>> {
    match conn {
        Some(c) => c.next_frame().await,
        None => std::future::pending().await,
    }
}

async fn opened(opening: &mut Option<OpenFuture>) -> Result<Box<dyn Connection>, StreamError> {
    match opening {
        Some(fut) => fut.await,
        None => std::future::pending().await,
    }
}

async fn retry_due(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

impl StreamTask {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                // Commands first: a key switch must tear down the old connection
                // before any more of its frames are read.
                biased;
                cmd = commands.recv() => match cmd {
                    Some(Command::Connect(key)) => self.connect(key).await,
                    Some(Command::Disconnect) => self.disconnect().await,
                    Some(Command::Shutdown(done)) => {
                        self.disconnect().await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        self.disconnect().await;
                        break;
                    }
                },
                result = opened(&mut self.opening) => {
                    self.opening = None;
                    self.on_opened(result);
                }
                frame = next_frame(&mut self.conn) => self.on_frame(frame).await,
                () = retry_due(self.retry_at) => {
                    self.retry_at = None;
                    self.start_open();
                }
            }
        }
        debug!("notification stream task stopped");
    }

    fn set_state(&self, state: StreamState) {
        debug!("stream state: {state:?}");
        self.state.send_replace(state);
    }

    async fn connect(&mut self, key: SubscriberKey) {
        let active = self.conn.is_some() || self.opening.is_some();
        if active && self.key.as_ref() == Some(&key) {
            debug!("already connected as {key}");
            return;
        }
        self.teardown(CloseCode::Normal).await;
        info!("connecting notification stream as {key}");
        self.key = Some(key);
        self.backoff.reset();
        self.start_open();
    }

    async fn disconnect(&mut self) {
        self.teardown(CloseCode::Normal).await;
        if let Some(key) = self.key.take() {
            info!("notification stream for {key} disconnected");
        }
        self.backoff.reset();
        self.set_state(StreamState::Disconnected);
    }

    /// Drop the connection, any in-flight open and any scheduled retry.
    async fn teardown(&mut self, code: CloseCode) {
        self.opening = None;
        self.retry_at = None;
        if let Some(mut conn) = self.conn.take() {
            conn.close(code).await;
            metrics::gauge!(STREAM_CONNECTED).set(0.0);
        }
    }

    fn start_open(&mut self) {
        let Some(key) = self.key.clone() else {
            return;
        };
        let transport = self.transport.clone();
        let open_key = key.clone();
        self.opening = Some(Box::pin(async move { transport.open(&open_key).await }));
        self.set_state(StreamState::Connecting {
            key,
            attempt: self.backoff.attempts(),
        });
    }

    fn on_opened(&mut self, result: Result<Box<dyn Connection>, StreamError>) {
        let Some(key) = self.key.clone() else {
            return;
        };
        match result {
            Ok(conn) => {
                info!("notification stream connected as {key}");
                self.conn = Some(conn);
                self.backoff.reset();
                metrics::gauge!(STREAM_CONNECTED).set(1.0);
                self.set_state(StreamState::Connected { key });
            }
            Err(e) => {
                warn!("notification stream connect as {key} failed: {e}");
                self.on_closed();
            }
        }
    }

    async fn on_frame(&mut self, frame: Option<Result<String, StreamError>>) {
        match frame {
            None => {
                info!("notification stream closed by peer");
                self.conn = None;
                metrics::gauge!(STREAM_CONNECTED).set(0.0);
                self.on_closed();
            }
            Some(Err(StreamError::Frame(msg))) => {
                warn!("dropping unreadable frame: {msg}");
                metrics::counter!(STREAM_MESSAGES_TOTAL, "status" => "unreadable").increment(1);
            }
            Some(Err(e)) => {
                warn!("notification stream error: {e}");
                if let Some(mut conn) = self.conn.take() {
                    conn.close(CloseCode::GoingAway).await;
                }
                metrics::gauge!(STREAM_CONNECTED).set(0.0);
                self.on_closed();
            }
            Some(Ok(line)) => self.on_line(&line),
        }
    }

    fn on_line(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match Notification::parse(line) {
            Ok(message) => {
                metrics::counter!(STREAM_MESSAGES_TOTAL, "status" => "ok").increment(1);
                let delivered = self.listeners.dispatch(&message);
                debug!("dispatched {:?} notice to {delivered} listener(s)", message.kind());
            }
            Err(e) => {
                warn!("dropping malformed notification: {e}");
                metrics::counter!(STREAM_MESSAGES_TOTAL, "status" => "malformed").increment(1);
            }
        }
    }

    /// The connection is gone (or never came up): schedule a retry or give up.
    fn on_closed(&mut self) {
        let Some(key) = self.key.clone() else {
            self.set_state(StreamState::Disconnected);
            return;
        };
        match self.backoff.on_close() {
            Some((attempt, delay)) => {
                info!("reconnecting as {key} in {delay:?} (attempt {attempt})");
                metrics::counter!(STREAM_RECONNECTS_TOTAL).increment(1);
                self.retry_at = Some(Instant::now() + delay);
                self.set_state(StreamState::Reconnecting { key, attempt, delay });
            }
            None => {
                error!(
                    "notification stream for {key} gave up after {} reconnect attempts",
                    self.backoff.attempts()
                );
                self.set_state(StreamState::Exhausted { key });
            }
        }
    }
}
