//! Turns raw watch events into logical change notifications.
//!
//! Editors rarely save in place. A typical save renames the original away,
//! writes a fresh file at the same path and touches its permissions, and the
//! watch primitive drops its target as soon as the original inode goes away.
//! The normalizer hides that: writes become a [`ChangeEvent`] immediately,
//! removes and renames schedule a re-arm of the same path after a settle delay
//! followed by one [`ChangeEvent`], and metadata/create noise is dropped.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::backend::{NotifyBackend, WatchBackend};
use super::raw::{RawEvent, RawKind};
use crate::error::WatchError;
use crate::file::{WatchedFile, resolve_watch_path};
use crate::update::ChangeEvent;

/// Delay before re-arming a watch after a remove or rename.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

const CHANGE_BUFFER: usize = 256;

/// Stream of logical change notifications produced by a [`WatchNormalizer`].
pub type ChangeEvents = mpsc::Receiver<ChangeEvent>;

/// Watches files and emits deduplicated [`ChangeEvent`]s.
///
/// Create it, [`watch`](Self::watch) every file, then [`spawn`](Self::spawn)
/// the consumption task. The change stream ends only when the normalizer task
/// stops.
pub struct WatchNormalizer {
    shared: Arc<Shared>,
    raw_events: mpsc::UnboundedReceiver<RawEvent>,
}

struct Shared {
    /// Only touched from `watch` at setup and from blocking re-arm tasks
    backend: Mutex<Box<dyn WatchBackend>>,
    state: Mutex<ArmState>,
    settle_delay: Duration,
    changes: mpsc::Sender<ChangeEvent>,
}

/// Watch targets owned by one normalizer.
struct ArmState {
    /// Resolved path -> logical id, fixed after setup
    targets: HashMap<PathBuf, String>,
    /// Paths the backend is currently tracking
    armed: HashSet<PathBuf>,
    /// Re-arms waiting for their burst to settle
    pending: HashMap<PathBuf, PendingRearm>,
    next_ticket: u64,
}

struct PendingRearm {
    /// Only the re-arm holding the latest ticket runs
    ticket: u64,
    /// The backend may still hold the old target
    stale: bool,
}

impl WatchNormalizer {
    /// Create a normalizer on top of the platform file watcher.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Backend`] if the watcher cannot be constructed.
    pub fn with_notify(settle_delay: Duration) -> Result<(Self, ChangeEvents), WatchError> {
        let (backend, raw_events) = NotifyBackend::new()?;
        Ok(Self::new(Box::new(backend), raw_events, settle_delay))
    }

    pub(crate) fn new(
        backend: Box<dyn WatchBackend>,
        raw_events: mpsc::UnboundedReceiver<RawEvent>,
        settle_delay: Duration,
    ) -> (Self, ChangeEvents) {
        let (changes, rx) = mpsc::channel(CHANGE_BUFFER);

        let shared = Arc::new(Shared {
            backend: Mutex::new(backend),
            state: Mutex::new(ArmState {
                targets: HashMap::new(),
                armed: HashSet::new(),
                pending: HashMap::new(),
                next_ticket: 0,
            }),
            settle_delay,
            changes,
        });

        (Self { shared, raw_events }, rx)
    }

    /// Start watching `file`.
    ///
    /// Arming waits on the watch primitive, so call this during setup rather
    /// than from a latency-sensitive task.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Setup`] if the path cannot be watched, or
    /// [`WatchError::Duplicate`] if the path is already registered. A failed
    /// file is not tracked at all; the caller decides how loudly to report it.
    pub fn watch(&self, file: &WatchedFile) -> Result<(), WatchError> {
        let path = file.absolute_path().to_path_buf();

        if self.shared.state.lock().targets.contains_key(&path) {
            return Err(WatchError::Duplicate(format!("path '{}'", path.display())));
        }

        self.shared
            .backend
            .lock()
            .watch(&path)
            .map_err(|source| WatchError::Setup {
                path: file.physical_path.clone(),
                source,
            })?;

        debug!(file = %file.logical_id, path = %path.display(), "watch armed");
        let mut state = self.shared.state.lock();
        state.targets.insert(path.clone(), file.logical_id.clone());
        state.armed.insert(path);
        Ok(())
    }

    /// Whether the backend currently tracks `file`.
    pub fn is_armed(&self, file: &WatchedFile) -> bool {
        self.shared.state.lock().armed.contains(file.absolute_path())
    }

    /// Spawn the raw-event consumption task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Drain raw events until the watcher goes away.
    pub async fn run(mut self) {
        while let Some(event) = self.raw_events.recv().await {
            Shared::handle_raw(&self.shared, event).await;
        }
        debug!("raw event stream closed, normalizer stopping");
    }
}

impl Shared {
    async fn handle_raw(self: &Arc<Self>, event: RawEvent) {
        let Some((path, logical_id)) = self.lookup(&event.path) else {
            trace!(path = %event.path.display(), "event for unwatched path");
            return;
        };

        match event.kind {
            RawKind::Write => self.emit(logical_id).await,
            RawKind::Remove | RawKind::Rename => self.schedule_rearm(path, logical_id),
            RawKind::Chmod | RawKind::Create => {
                trace!(file = %logical_id, kind = ?event.kind, "ignored event");
            }
        }
    }

    /// Find the target an event path belongs to.
    ///
    /// Backends normally report the path they were given; anything else is
    /// resolved the same way targets were before giving up.
    fn lookup(&self, path: &Path) -> Option<(PathBuf, String)> {
        if let Some(id) = self.state.lock().targets.get(path) {
            return Some((path.to_path_buf(), id.clone()));
        }

        let resolved = resolve_watch_path(path);
        let id = self.state.lock().targets.get(&resolved).cloned()?;
        Some((resolved, id))
    }

    async fn emit(&self, logical_id: String) {
        debug!(file = %logical_id, "content changed");
        if self.changes.send(ChangeEvent::new(logical_id)).await.is_err() {
            debug!("change receiver dropped");
        }
    }

    /// Forget the stale target and re-arm it once the burst settles.
    ///
    /// Each call supersedes any re-arm still waiting for the same path, so a
    /// burst of removes and renames produces one attempt, one settle delay after
    /// its last event.
    fn schedule_rearm(self: &Arc<Self>, path: PathBuf, logical_id: String) {
        let ticket = {
            let mut state = self.state.lock();
            let stale = state.armed.remove(&path);

            state.next_ticket += 1;
            let ticket = state.next_ticket;
            let pending = state
                .pending
                .entry(path.clone())
                .or_insert(PendingRearm { ticket, stale });
            pending.ticket = ticket;
            pending.stale |= stale;
            ticket
        };

        debug!(file = %logical_id, delay_ms = self.settle_delay.as_millis() as u64, "re-arm scheduled");

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(shared.settle_delay).await;
            shared.rearm(path, logical_id, ticket).await;
        });
    }

    async fn rearm(self: Arc<Self>, path: PathBuf, logical_id: String, ticket: u64) {
        // Arming is a round trip to the watcher thread
        let attempt = {
            let shared = Arc::clone(&self);
            let path = path.clone();
            tokio::task::spawn_blocking(move || shared.rearm_blocking(&path, ticket)).await
        };

        match attempt {
            Ok(Some(Ok(()))) => {
                info!(file = %logical_id, "watch re-armed");
                self.emit(logical_id).await;
            }
            Ok(Some(Err(source))) => {
                let err = WatchError::Setup { path, source };
                warn!(file = %logical_id, error = %err, "re-arm failed, file is no longer watched");
            }
            Ok(None) => trace!(file = %logical_id, "re-arm superseded"),
            Err(e) => warn!(file = %logical_id, error = %e, "re-arm task failed"),
        }
    }

    /// Returns `None` when a later event superseded this re-arm.
    fn rearm_blocking(&self, path: &Path, ticket: u64) -> Option<notify::Result<()>> {
        let stale = {
            let mut state = self.state.lock();
            if state.pending.get(path).map(|p| p.ticket) != Some(ticket) {
                return None;
            }
            state.pending.remove(path)?.stale
        };

        let result = {
            let mut backend = self.backend.lock();
            // Most backends already dropped the target with the inode
            if stale {
                if let Err(e) = backend.unwatch(path) {
                    trace!(path = %path.display(), error = %e, "stale watch already gone");
                }
            }
            backend.watch(path)
        };

        if result.is_ok() {
            self.state.lock().armed.insert(path.to_path_buf());
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Watch(PathBuf),
        Unwatch(PathBuf),
    }

    #[derive(Default)]
    struct MockState {
        calls: Vec<Call>,
        missing: HashSet<PathBuf>,
    }

    #[derive(Clone, Default)]
    struct MockBackend(Arc<Mutex<MockState>>);

    impl MockBackend {
        fn calls(&self) -> Vec<Call> {
            self.0.lock().calls.clone()
        }

        fn set_missing(&self, path: &Path, missing: bool) {
            let mut state = self.0.lock();
            if missing {
                state.missing.insert(path.to_path_buf());
            } else {
                state.missing.remove(path);
            }
        }

        fn watch_count(&self, path: &Path) -> usize {
            self.calls()
                .iter()
                .filter(|c| **c == Call::Watch(path.to_path_buf()))
                .count()
        }
    }

    impl WatchBackend for MockBackend {
        fn watch(&mut self, path: &Path) -> notify::Result<()> {
            let mut state = self.0.lock();
            state.calls.push(Call::Watch(path.to_path_buf()));
            if state.missing.contains(path) {
                Err(notify::Error::path_not_found())
            } else {
                Ok(())
            }
        }

        fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
            self.0.lock().calls.push(Call::Unwatch(path.to_path_buf()));
            Err(notify::Error::watch_not_found())
        }
    }

    struct Harness {
        backend: MockBackend,
        raw: mpsc::UnboundedSender<RawEvent>,
        changes: ChangeEvents,
    }

    fn start(files: &[&WatchedFile]) -> Harness {
        let backend = MockBackend::default();
        let (raw, raw_rx) = mpsc::unbounded_channel();
        let (normalizer, changes) =
            WatchNormalizer::new(Box::new(backend.clone()), raw_rx, DEFAULT_SETTLE_DELAY);
        for file in files {
            normalizer.watch(file).unwrap();
        }
        normalizer.spawn();
        Harness {
            backend,
            raw,
            changes,
        }
    }

    fn send(h: &Harness, file: &WatchedFile, kind: RawKind) {
        h.raw
            .send(RawEvent::new(file.absolute_path(), kind))
            .unwrap();
    }

    async fn assert_quiet(h: &mut Harness) {
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.changes.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_emits_immediately() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);

        let started = Instant::now();
        send(&h, &file, RawKind::Write);

        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
        assert!(started.elapsed() < DEFAULT_SETTLE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_write_is_reported() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);

        for _ in 0..3 {
            send(&h, &file, RawKind::Write);
        }
        for _ in 0..3 {
            assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
        }
        assert_quiet(&mut h).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_and_create_ignored() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);

        send(&h, &file, RawKind::Chmod);
        send(&h, &file, RawKind::Create);

        assert_quiet(&mut h).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_path_ignored() {
        let file = WatchedFile::new("/srv/test", "test");
        let other = WatchedFile::new("/srv/other", "other");
        let mut h = start(&[&file]);

        send(&h, &other, RawKind::Write);

        assert_quiet(&mut h).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_rearms_after_settle_delay() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);
        let path = file.absolute_path().to_path_buf();

        let started = Instant::now();
        send(&h, &file, RawKind::Remove);

        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
        assert!(started.elapsed() >= DEFAULT_SETTLE_DELAY);
        assert_eq!(
            h.backend.calls(),
            vec![
                Call::Watch(path.clone()),
                Call::Unwatch(path.clone()),
                Call::Watch(path.clone())
            ]
        );

        // The re-armed watch still reports writes
        send(&h, &file, RawKind::Write);
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_editor_save_burst_collapses_to_one_rearm() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);

        let started = Instant::now();
        send(&h, &file, RawKind::Rename);
        send(&h, &file, RawKind::Chmod);
        tokio::time::sleep(Duration::from_millis(50)).await;
        send(&h, &file, RawKind::Remove);

        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert_eq!(h.backend.watch_count(file.absolute_path()), 2);

        assert_quiet(&mut h).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_each_rearm() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);

        send(&h, &file, RawKind::Rename);
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));

        send(&h, &file, RawKind::Rename);
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));

        assert_eq!(h.backend.watch_count(file.absolute_path()), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_rearm_leaves_file_unwatched() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);
        h.backend.set_missing(file.absolute_path(), true);

        send(&h, &file, RawKind::Remove);

        assert_quiet(&mut h).await;
        // Exactly one retry, no loop
        assert_eq!(h.backend.watch_count(file.absolute_path()), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_on_one_file_does_not_delay_another() {
        let slow = WatchedFile::new("/srv/slow", "slow");
        let fast = WatchedFile::new("/srv/fast", "fast");
        let mut h = start(&[&slow, &fast]);

        let started = Instant::now();
        send(&h, &slow, RawKind::Remove);
        send(&h, &fast, RawKind::Write);

        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("fast")));
        assert!(started.elapsed() < DEFAULT_SETTLE_DELAY);
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("slow")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_while_rearm_pending_still_reported() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);

        send(&h, &file, RawKind::Rename);
        send(&h, &file, RawKind::Write);

        // Immediate write notification, then the post-re-arm flush
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));
    }

    #[cfg(unix)]
    fn symlinked_file() -> (tempfile::TempDir, WatchedFile, PathBuf, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let file = WatchedFile::new(link.join("notes.md"), "notes");
        let canonical = real.canonicalize().unwrap().join("notes.md");
        (dir, file, canonical, link.join("notes.md"))
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_symlinked_directory_matches_canonical_event_path() {
        let (_dir, file, canonical, _) = symlinked_file();
        let mut h = start(&[&file]);
        assert_eq!(h.backend.calls(), vec![Call::Watch(canonical.clone())]);

        // Backends that resolve symlinks report the real location
        h.raw.send(RawEvent::new(&canonical, RawKind::Write)).unwrap();
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("notes")));

        h.raw.send(RawEvent::new(&canonical, RawKind::Rename)).unwrap();
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("notes")));
        assert_eq!(h.backend.watch_count(&canonical), 2);
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_event_through_symlink_still_matches() {
        let (_dir, file, canonical, through_link) = symlinked_file();
        let mut h = start(&[&file]);

        h.raw
            .send(RawEvent::new(&through_link, RawKind::Remove))
            .unwrap();

        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("notes")));
        // Re-armed under the resolved key, not the reported spelling
        assert_eq!(h.backend.watch_count(&canonical), 2);
        assert_eq!(h.backend.watch_count(&through_link), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_unwatches_stale_target_once_per_burst() {
        let file = WatchedFile::new("/srv/test", "test");
        let mut h = start(&[&file]);
        let path = file.absolute_path().to_path_buf();

        send(&h, &file, RawKind::Rename);
        send(&h, &file, RawKind::Remove);
        assert_eq!(h.changes.recv().await, Some(ChangeEvent::new("test")));

        let unwatches = h
            .backend
            .calls()
            .iter()
            .filter(|c| **c == Call::Unwatch(path.clone()))
            .count();
        assert_eq!(unwatches, 1);
    }

    #[test]
    fn test_watch_setup_failure() {
        let file = WatchedFile::new("/srv/missing", "missing");
        let backend = MockBackend::default();
        backend.set_missing(file.absolute_path(), true);
        let (_raw, raw_rx) = mpsc::unbounded_channel();
        let (normalizer, _changes) =
            WatchNormalizer::new(Box::new(backend), raw_rx, DEFAULT_SETTLE_DELAY);

        let err = normalizer.watch(&file).unwrap_err();
        assert!(matches!(err, WatchError::Setup { .. }));
        assert!(!normalizer.is_armed(&file));
    }

    #[test]
    fn test_watch_same_path_twice_rejected() {
        let file = WatchedFile::new("/srv/test", "test");
        let (_raw, raw_rx) = mpsc::unbounded_channel();
        let (normalizer, _changes) =
            WatchNormalizer::new(Box::new(MockBackend::default()), raw_rx, DEFAULT_SETTLE_DELAY);

        normalizer.watch(&file).unwrap();
        assert!(normalizer.is_armed(&file));
        assert!(matches!(
            normalizer.watch(&file),
            Err(WatchError::Duplicate(_))
        ));
    }
}
