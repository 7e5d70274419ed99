//! Watched file identity.
//!
//! A [`WatchedFile`] pairs a physical path with the stable logical id that
//! clients use to address it. The set is fixed at startup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::WatchError;

/// One file under watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFile {
    /// Path as configured
    pub physical_path: PathBuf,
    /// Identifier clients use, independent of renames
    pub logical_id: String,
    /// Resolved form of `physical_path`, used to arm the watch and match raw events
    absolute_path: PathBuf,
}

impl WatchedFile {
    /// Create a watched file with an explicit logical id.
    pub fn new(physical_path: impl Into<PathBuf>, logical_id: impl Into<String>) -> Self {
        let physical_path = physical_path.into();
        let absolute_path = resolve_watch_path(&physical_path);

        Self {
            physical_path,
            logical_id: logical_id.into(),
            absolute_path,
        }
    }

    /// Absolute path handed to the watch primitive.
    pub fn absolute_path(&self) -> &Path {
        &self.absolute_path
    }
}

/// Resolve `path` to the key raw watch events are matched against.
///
/// The parent directory is canonicalized, since some backends (FSEvents)
/// report events under the real path: `/private/tmp/x` for `/tmp/x`. The file
/// name is kept as given because editors replace the file behind it. When the
/// parent does not exist the plain absolute path is used.
pub(crate) fn resolve_watch_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let (Some(parent), Some(name)) = (absolute.parent(), absolute.file_name()) else {
        return absolute;
    };
    match parent.canonicalize() {
        Ok(parent) => parent.join(name),
        Err(_) => absolute,
    }
}

/// Derive a logical id from a path: the final component, or the whole path
/// when there is none.
pub fn default_logical_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// The fixed set of watched files, addressable by logical id or path.
#[derive(Debug, Clone, Default)]
pub struct WatchedFiles {
    files: Vec<WatchedFile>,
}

impl WatchedFiles {
    /// Build the set, rejecting duplicate logical ids or physical paths.
    pub fn new(files: Vec<WatchedFile>) -> Result<Self, WatchError> {
        let mut ids = HashSet::new();
        let mut paths = HashSet::new();

        for file in &files {
            if !ids.insert(file.logical_id.as_str()) {
                return Err(WatchError::Duplicate(format!(
                    "logical id '{}'",
                    file.logical_id
                )));
            }
            if !paths.insert(file.absolute_path()) {
                return Err(WatchError::Duplicate(format!(
                    "path '{}'",
                    file.physical_path.display()
                )));
            }
        }

        Ok(Self { files })
    }

    /// Look up a file by its logical id.
    pub fn by_logical_id(&self, logical_id: &str) -> Option<&WatchedFile> {
        self.files.iter().find(|f| f.logical_id == logical_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}
