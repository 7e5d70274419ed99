//! The raw watch primitive behind the normalizer.

use std::path::Path;

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::raw::RawEvent;
use crate::error::WatchError;

/// Arms and disarms individual paths on a raw watch primitive.
pub(crate) trait WatchBackend: Send + 'static {
    fn watch(&mut self, path: &Path) -> notify::Result<()>;
    fn unwatch(&mut self, path: &Path) -> notify::Result<()>;
}

/// Platform watcher from the notify crate (inotify, FSEvents, ...).
pub(crate) struct NotifyBackend {
    watcher: RecommendedWatcher,
}

impl NotifyBackend {
    /// Create the platform watcher and the channel its events arrive on.
    ///
    /// The channel is unbounded so the notify thread never blocks on a busy
    /// consumer while that consumer waits on the watcher to arm a path.
    pub(crate) fn new() -> Result<(Self, mpsc::UnboundedReceiver<RawEvent>), WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for raw in RawEvent::from_notify(event) {
                    // Receiver gone means the normalizer stopped
                    if tx.send(raw).is_err() {
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "file watcher error"),
        })
        .map_err(WatchError::Backend)?;

        Ok((Self { watcher }, rx))
    }
}

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        self.watcher.unwatch(path)
    }
}
