use std::collections::HashSet;

use livefile_core::WatchedFile;

use crate::config::LivefileConfig;
use crate::error::{ConfigError, Result};

impl LivefileConfig {
    /// Validate configuration for logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(ConfigError::MissingField {
                field: "files".to_string(),
                hint: "Pass FILE arguments or add [[files]] entries to livefile.toml".to_string(),
            }
            .into());
        }

        let mut ids = HashSet::new();
        let mut paths = HashSet::new();

        for entry in &self.files {
            if entry.path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "files.path".to_string(),
                    value: String::new(),
                    hint: "Every watched file needs a path".to_string(),
                }
                .into());
            }

            let id = entry.logical_id();
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "files.id".to_string(),
                    value: id,
                    hint: format!("Give {} a non-empty id", entry.path.display()),
                }
                .into());
            }
            if !ids.insert(id.clone()) {
                return Err(ConfigError::Duplicate {
                    kind: "id",
                    value: id,
                }
                .into());
            }

            let resolved = WatchedFile::new(&entry.path, id);
            if !paths.insert(resolved.absolute_path().to_path_buf()) {
                return Err(ConfigError::Duplicate {
                    kind: "path",
                    value: entry.path.display().to_string(),
                }
                .into());
            }
        }

        if !self.ws_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "ws_path".to_string(),
                value: self.ws_path.clone(),
                hint: "The upgrade route must start with '/'".to_string(),
            }
            .into());
        }

        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue_capacity".to_string(),
                value: "0".to_string(),
                hint: "Each client needs room for at least one update".to_string(),
            }
            .into());
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms".to_string(),
                value: "0".to_string(),
                hint: "Use a positive deadline in milliseconds".to_string(),
            }
            .into());
        }

        Ok(())
    }
}
