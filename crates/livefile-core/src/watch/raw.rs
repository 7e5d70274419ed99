//! Raw file-system event vocabulary.
//!
//! These types never leave the `watch` module. Everything downstream sees
//! only [`ChangeEvent`](crate::update::ChangeEvent).

use notify::EventKind;
use notify::event::ModifyKind;
use std::path::PathBuf;

/// Kind of a raw watch event for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawKind {
    /// Content was written or appended
    Write,
    /// The path was deleted
    Remove,
    /// The path was renamed away (or onto)
    Rename,
    /// Permissions or other metadata were touched
    Chmod,
    /// A file appeared at the path
    Create,
}

impl RawKind {
    /// Classify a notify event kind, returning `None` for kinds with no
    /// bearing on content (access, unknown).
    pub(crate) fn from_notify(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                Some(RawKind::Write)
            }
            EventKind::Modify(ModifyKind::Metadata(_)) => Some(RawKind::Chmod),
            EventKind::Modify(ModifyKind::Name(_)) => Some(RawKind::Rename),
            EventKind::Create(_) => Some(RawKind::Create),
            EventKind::Remove(_) => Some(RawKind::Remove),
            EventKind::Modify(ModifyKind::Other)
            | EventKind::Access(_)
            | EventKind::Any
            | EventKind::Other => None,
        }
    }
}

/// A raw event for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEvent {
    pub(crate) path: PathBuf,
    pub(crate) kind: RawKind,
}

impl RawEvent {
    pub(crate) fn new(path: impl Into<PathBuf>, kind: RawKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Split a notify event into one raw event per affected path.
    pub(crate) fn from_notify(event: notify::Event) -> Vec<Self> {
        let Some(kind) = RawKind::from_notify(&event.kind) else {
            return Vec::new();
        };
        event
            .paths
            .into_iter()
            .map(|path| Self { path, kind })
            .collect()
    }
}
