use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One watched file as configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Physical path, relative to the working directory
    pub path: PathBuf,

    /// Logical id; defaults to the file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl FileEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id: None,
        }
    }

    pub fn with_id(path: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            id: Some(id.into()),
        }
    }

    /// The configured id, or the file name when none was given.
    pub fn logical_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| livefile_core::default_logical_id(&self.path))
    }
}
