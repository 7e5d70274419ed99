//! One accepted client connection.
//!
//! A session owns a bounded outbox and two loops over the socket halves. The
//! send loop drains the outbox in order, the receive loop watches for inbound
//! frames and for the connection dropping. Whichever side fails first closes
//! the session, which removes it from the registry exactly once and stops the
//! other loop.

mod outbox;

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ws::Message;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::ConnectionError;
use crate::registry::ClientRegistry;
use crate::update::Update;
use outbox::{Outbox, Pushed};

pub use outbox::OverflowPolicy;

/// Default bound on queued updates per session.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Default keep-alive ping period.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(30);

/// Opaque session identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a session. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closing,
    Closed,
}

const OPEN: u8 = 0;
const CLOSING: u8 = 1;
const CLOSED: u8 = 2;

/// Per-session tuning.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub queue_capacity: usize,
    pub overflow: OverflowPolicy,
    /// `None` disables keep-alive pings
    pub ping_interval: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            overflow: OverflowPolicy::default(),
            ping_interval: Some(DEFAULT_PING_INTERVAL),
        }
    }
}

/// What happened to an update handed to [`ClientSession::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Queued for the send loop
    Queued,
    /// Queued after evicting the oldest pending update
    ReplacedOldest,
    /// Discarded because the outbox was full
    Dropped,
    /// The outbox was full under [`OverflowPolicy::Disconnect`]; the caller
    /// should close the session
    Overflowed,
    /// The session is no longer open
    Closed,
}

/// One connected client.
pub struct ClientSession {
    id: SessionId,
    outbox: Outbox,
    state: AtomicU8,
    shutdown: CancellationToken,
    dropped: AtomicU64,
    ping_interval: Option<Duration>,
    connected_at: Instant,
}

impl ClientSession {
    pub fn new(id: SessionId, config: &SessionConfig) -> Self {
        Self {
            id,
            outbox: Outbox::new(config.queue_capacity, config.overflow),
            state: AtomicU8::new(OPEN),
            shutdown: CancellationToken::new(),
            dropped: AtomicU64::new(0),
            ping_interval: config.ping_interval,
            connected_at: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        match self.state.load(Ordering::Acquire) {
            OPEN => SessionState::Open,
            CLOSING => SessionState::Closing,
            _ => SessionState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == SessionState::Open
    }

    /// Updates lost to the overflow policy so far.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Updates waiting for the send loop.
    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    /// Time since the connection was accepted.
    pub fn age(&self) -> Duration {
        self.connected_at.elapsed()
    }

    #[cfg(test)]
    pub(crate) fn try_next_queued(&self) -> Option<Arc<Update>> {
        self.outbox.try_pop()
    }

    /// Queue an update for this client without blocking.
    pub fn enqueue(&self, update: Arc<Update>) -> Delivery {
        if !self.is_open() {
            return Delivery::Closed;
        }

        match self.outbox.push(update) {
            Pushed::Queued => Delivery::Queued,
            Pushed::EvictedOldest => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::ReplacedOldest
            }
            Pushed::Rejected => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Delivery::Dropped
            }
            Pushed::Overflowed => Delivery::Overflowed,
        }
    }

    /// Tear the session down and drop it from `registry`.
    ///
    /// Only the first call does anything; it returns `true`. Safe to call from
    /// both loops and from a broadcaster at the same time.
    pub fn close(&self, registry: &ClientRegistry, reason: &ConnectionError) -> bool {
        if self
            .state
            .compare_exchange(OPEN, CLOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            trace!(session = %self.id, reason = %reason, "already closed");
            return false;
        }

        self.shutdown.cancel();
        registry.remove(self.id);
        self.state.store(CLOSED, Ordering::Release);

        let age = self.age();
        match reason {
            ConnectionError::ClosedByPeer => {
                info!(session = %self.id, ?age, "client disconnected")
            }
            _ => warn!(
                session = %self.id,
                reason = %reason,
                ?age,
                dropped = self.dropped_count(),
                "session closed"
            ),
        }
        true
    }

    /// Drain the outbox onto `sink` until the session closes or a write fails.
    pub async fn run_send_loop<S>(self: Arc<Self>, registry: Arc<ClientRegistry>, mut sink: S)
    where
        S: Sink<Message> + Unpin,
        S::Error: fmt::Display,
    {
        let mut ping = self.ping_interval.map(|period| {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval
        });

        loop {
            let frame = tokio::select! {
                next = self.outbox.pop(&self.shutdown) => match next {
                    Some(update) => match update.to_json() {
                        Ok(json) => Message::Text(json.into()),
                        Err(e) => {
                            warn!(session = %self.id, file = %update.file, error = %e, "failed to encode update");
                            continue;
                        }
                    },
                    None => break,
                },
                _ = next_ping(&mut ping) => Message::Ping(Vec::new().into()),
            };

            if let Err(e) = sink.send(frame).await {
                self.close(&registry, &ConnectionError::Write(e.to_string()));
                break;
            }
        }

        // Best effort: the peer may already be gone
        let _ = sink.close().await;
        debug!(session = %self.id, "send loop finished");
    }

    /// Read inbound frames until the peer leaves, a read fails, or the session
    /// is closed from elsewhere. Text frames are passed to `on_text`.
    pub async fn run_receive_loop<R, E, F>(
        self: Arc<Self>,
        registry: Arc<ClientRegistry>,
        mut stream: R,
        mut on_text: F,
    ) where
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
        F: FnMut(&Arc<ClientSession>, &str),
    {
        loop {
            let frame = tokio::select! {
                frame = stream.next() => frame,
                _ = self.shutdown.cancelled() => break,
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    debug!(session = %self.id, text = %text.as_str(), "inbound message");
                    on_text(&self, text.as_str());
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!(session = %self.id, bytes = data.len(), "ignoring binary message");
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.close(&registry, &ConnectionError::ClosedByPeer);
                    break;
                }
                // Ping/pong replies are handled by the protocol layer
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.close(&registry, &ConnectionError::Read(e.to_string()));
                    break;
                }
            }
        }
        debug!(session = %self.id, "receive loop finished");
    }

    /// Run both loops over a split connection until the session closes.
    pub async fn serve<S, R, E, F>(
        self: Arc<Self>,
        registry: Arc<ClientRegistry>,
        sink: S,
        stream: R,
        on_text: F,
    ) where
        S: Sink<Message> + Unpin + Send + 'static,
        S::Error: fmt::Display + Send,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: fmt::Display,
        F: FnMut(&Arc<ClientSession>, &str),
    {
        let sender = tokio::spawn(Arc::clone(&self).run_send_loop(Arc::clone(&registry), sink));
        Arc::clone(&self)
            .run_receive_loop(Arc::clone(&registry), stream, on_text)
            .await;

        // The receive loop only ends once the session is closed, which stops
        // the send loop too.
        if let Err(e) = sender.await {
            warn!(session = %self.id, error = %e, "send loop panicked");
        }
    }
}

impl fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSession")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish()
    }
}

async fn next_ping(ping: &mut Option<tokio::time::Interval>) {
    match ping {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
