//! Bounded outbound queue for one session.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::update::Update;

/// What an outbox does when it is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Evict the oldest queued update. Each update carries the full content, so
    /// the newest one supersedes what it replaces.
    #[default]
    DropOldest,
    /// Discard the incoming update.
    DropNewest,
    /// Tear the session down as a slow consumer.
    Disconnect,
}

impl OverflowPolicy {
    /// The name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DropOldest => "drop-oldest",
            Self::DropNewest => "drop-newest",
            Self::Disconnect => "disconnect",
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of pushing onto an outbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pushed {
    Queued,
    EvictedOldest,
    Rejected,
    Overflowed,
}

/// Multi-producer, single-consumer queue with a hard bound.
pub(crate) struct Outbox {
    queue: Mutex<VecDeque<Arc<Update>>>,
    ready: Notify,
    capacity: usize,
    policy: OverflowPolicy,
}

impl Outbox {
    pub(crate) fn new(capacity: usize, policy: OverflowPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            ready: Notify::new(),
            capacity,
            policy,
        }
    }

    pub(crate) fn push(&self, update: Arc<Update>) -> Pushed {
        let pushed = {
            let mut queue = self.queue.lock();
            if queue.len() < self.capacity {
                queue.push_back(update);
                Pushed::Queued
            } else {
                match self.policy {
                    OverflowPolicy::DropOldest => {
                        queue.pop_front();
                        queue.push_back(update);
                        Pushed::EvictedOldest
                    }
                    OverflowPolicy::DropNewest => Pushed::Rejected,
                    OverflowPolicy::Disconnect => Pushed::Overflowed,
                }
            }
        };

        if matches!(pushed, Pushed::Queued | Pushed::EvictedOldest) {
            // Stores a permit when the consumer is not parked yet
            self.ready.notify_one();
        }
        pushed
    }

    /// Wait for the next update in FIFO order, or `None` once `shutdown` fires.
    pub(crate) async fn pop(&self, shutdown: &CancellationToken) -> Option<Arc<Update>> {
        loop {
            if shutdown.is_cancelled() {
                return None;
            }
            if let Some(update) = self.queue.lock().pop_front() {
                return Some(update);
            }
            tokio::select! {
                _ = self.ready.notified() => {}
                _ = shutdown.cancelled() => return None,
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn try_pop(&self) -> Option<Arc<Update>> {
        self.queue.lock().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn update(content: &str) -> Arc<Update> {
        Arc::new(Update::new("test", content))
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let outbox = Outbox::new(8, OverflowPolicy::DropOldest);
        let shutdown = CancellationToken::new();

        for i in 0..3 {
            assert_eq!(outbox.push(update(&format!("v{i}"))), Pushed::Queued);
        }
        for i in 0..3 {
            let next = outbox.pop(&shutdown).await.unwrap();
            assert_eq!(next.content, format!("v{i}"));
        }
    }

    #[test]
    fn test_display_matches_config_name() {
        for policy in [
            OverflowPolicy::DropOldest,
            OverflowPolicy::DropNewest,
            OverflowPolicy::Disconnect,
        ] {
            let serialized = serde_json::to_string(&policy).unwrap();
            assert_eq!(format!("\"{policy}\""), serialized);

            let parsed: OverflowPolicy = serde_json::from_str(&serialized).unwrap();
            assert_eq!(parsed, policy);
        }
    }

    #[tokio::test]
    async fn test_drop_oldest_keeps_newest() {
        let outbox = Outbox::new(2, OverflowPolicy::DropOldest);
        let shutdown = CancellationToken::new();

        outbox.push(update("v1"));
        outbox.push(update("v2"));
        assert_eq!(outbox.push(update("v3")), Pushed::EvictedOldest);
        assert_eq!(outbox.len(), 2);

        assert_eq!(outbox.pop(&shutdown).await.unwrap().content, "v2");
        assert_eq!(outbox.pop(&shutdown).await.unwrap().content, "v3");
    }

    #[tokio::test]
    async fn test_drop_newest_rejects() {
        let outbox = Outbox::new(1, OverflowPolicy::DropNewest);
        let shutdown = CancellationToken::new();

        outbox.push(update("v1"));
        assert_eq!(outbox.push(update("v2")), Pushed::Rejected);
        assert_eq!(outbox.pop(&shutdown).await.unwrap().content, "v1");
    }

    #[tokio::test]
    async fn test_disconnect_reports_overflow() {
        let outbox = Outbox::new(1, OverflowPolicy::Disconnect);
        outbox.push(update("v1"));
        assert_eq!(outbox.push(update("v2")), Pushed::Overflowed);
        assert_eq!(outbox.len(), 1);
    }

    #[tokio::test]
    async fn test_pop_waits_for_push() {
        let outbox = Arc::new(Outbox::new(4, OverflowPolicy::DropOldest));
        let shutdown = CancellationToken::new();

        let producer = Arc::clone(&outbox);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            producer.push(update("late"));
        });

        let next = outbox.pop(&shutdown).await.unwrap();
        assert_eq!(next.content, "late");
    }

    #[tokio::test]
    async fn test_pop_returns_none_on_shutdown() {
        let outbox = Outbox::new(4, OverflowPolicy::DropOldest);
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        outbox.push(update("ignored"));
        assert!(outbox.pop(&shutdown).await.is_none());
    }

    #[test]
    fn test_policy_serde_names() {
        assert_eq!(
            serde_json::to_string(&OverflowPolicy::DropOldest).unwrap(),
            "\"drop-oldest\""
        );
        let policy: OverflowPolicy = serde_json::from_str("\"disconnect\"").unwrap();
        assert_eq!(policy, OverflowPolicy::Disconnect);
    }
}
