//! Fan-out of file content to every connected client.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ConnectionError, ReadError};
use crate::file::{WatchedFile, WatchedFiles};
use crate::reader::read_content;
use crate::registry::ClientRegistry;
use crate::session::{ClientSession, Delivery};
use crate::update::{ChangeEvent, Update};
use crate::watch::ChangeEvents;

/// Result of handling one [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Delivered {
        /// Sessions the update was queued for
        recipients: usize,
        /// Sessions that lost an update to their overflow policy
        dropped: usize,
        /// Sessions closed as slow consumers
        disconnected: usize,
    },
    /// Nobody connected; the file was not read
    NoClients,
    /// The logical id is not in the watched set
    UnknownFile,
    /// The file could not be read; nothing was sent
    ReadFailed,
}

/// Reads changed files and queues their content on every session.
///
/// Delivery never waits on a client: each session's outbox absorbs or drops
/// the update according to its overflow policy.
///
/// Broadcasts and snapshots hold one ordering lock from the read until the
/// update is queued, so an outbox always receives content in the order it
/// was read and a snapshot can never land after newer content.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    files: Arc<WatchedFiles>,
    registry: Arc<ClientRegistry>,
    ordering: Arc<Mutex<()>>,
}

impl Broadcaster {
    pub fn new(files: Arc<WatchedFiles>, registry: Arc<ClientRegistry>) -> Self {
        Self {
            files,
            registry,
            ordering: Arc::new(Mutex::new(())),
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Read the changed file once and queue it for every registered session.
    pub async fn handle_change(&self, event: &ChangeEvent) -> BroadcastOutcome {
        let Some(file) = self.files.by_logical_id(&event.logical_id) else {
            warn!(file = %event.logical_id, "change for unknown file");
            return BroadcastOutcome::UnknownFile;
        };

        if self.registry.is_empty() {
            debug!(file = %file.logical_id, "no clients connected, skipping read");
            return BroadcastOutcome::NoClients;
        }

        let _ordering = self.ordering.lock().await;
        let update = match self.load(file).await {
            Ok(update) => Arc::new(update),
            Err(e) => {
                warn!(file = %file.logical_id, error = %e, "skipping broadcast");
                return BroadcastOutcome::ReadFailed;
            }
        };

        let mut recipients = 0;
        let mut dropped = 0;
        let mut disconnected = 0;

        for session in self.registry.snapshot() {
            match session.enqueue(Arc::clone(&update)) {
                Delivery::Queued => recipients += 1,
                Delivery::ReplacedOldest => {
                    recipients += 1;
                    dropped += 1;
                }
                Delivery::Dropped => dropped += 1,
                Delivery::Overflowed => {
                    if session.close(&self.registry, &ConnectionError::SlowConsumer) {
                        disconnected += 1;
                    }
                }
                // Closed between the snapshot and now
                Delivery::Closed => {}
            }
        }

        if dropped > 0 || disconnected > 0 {
            warn!(
                file = %file.logical_id,
                dropped,
                disconnected,
                "slow clients missed an update"
            );
        }
        info!(
            file = %file.logical_id,
            bytes = update.content.len(),
            recipients,
            "broadcast update"
        );

        BroadcastOutcome::Delivered {
            recipients,
            dropped,
            disconnected,
        }
    }

    /// Queue the current content of `logical_id` for a single session.
    ///
    /// Used to answer a client that asks for a file right after connecting.
    /// Returns `None` when nothing was offered to the session: the id is not
    /// watched or the file could not be read.
    pub async fn send_snapshot(
        &self,
        session: &ClientSession,
        logical_id: &str,
    ) -> Option<Delivery> {
        let Some(file) = self.files.by_logical_id(logical_id) else {
            debug!(session = %session.id(), file = %logical_id, "snapshot for unknown file");
            return None;
        };

        let _ordering = self.ordering.lock().await;
        let update = match self.load(file).await {
            Ok(update) => update,
            Err(e) => {
                warn!(session = %session.id(), file = %logical_id, error = %e, "snapshot read failed");
                return None;
            }
        };

        let delivery = session.enqueue(Arc::new(update));
        if delivery == Delivery::Overflowed {
            session.close(&self.registry, &ConnectionError::SlowConsumer);
        }
        Some(delivery)
    }

    /// Consume change events until the stream ends.
    pub async fn run(self, mut changes: ChangeEvents) {
        while let Some(event) = changes.recv().await {
            self.handle_change(&event).await;
        }
        debug!("change stream closed, broadcaster stopping");
    }

    pub fn spawn(self, changes: ChangeEvents) -> JoinHandle<()> {
        tokio::spawn(self.run(changes))
    }

    async fn load(&self, file: &WatchedFile) -> Result<Update, ReadError> {
        let content = read_content(file).await?;
        Ok(Update::new(file.logical_id.clone(), content))
    }
}
