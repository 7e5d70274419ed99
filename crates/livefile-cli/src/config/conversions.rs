use std::time::Duration;

use livefile_core::{OverflowPolicy, SessionConfig, WatchError, WatchedFile, WatchedFiles};

use crate::config::LivefileConfig;

// CLI enums -> core types

impl From<crate::cli::Overflow> for OverflowPolicy {
    fn from(o: crate::cli::Overflow) -> Self {
        match o {
            crate::cli::Overflow::DropOldest => OverflowPolicy::DropOldest,
            crate::cli::Overflow::DropNewest => OverflowPolicy::DropNewest,
            crate::cli::Overflow::Disconnect => OverflowPolicy::Disconnect,
        }
    }
}

impl LivefileConfig {
    /// The watched set, with default ids filled in.
    pub fn watched_files(&self) -> Result<WatchedFiles, WatchError> {
        WatchedFiles::new(
            self.files
                .iter()
                .map(|entry| WatchedFile::new(&entry.path, entry.logical_id()))
                .collect(),
        )
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            queue_capacity: self.queue_capacity,
            overflow: self.overflow,
            ping_interval: (self.ping_interval_secs > 0)
                .then(|| Duration::from_secs(self.ping_interval_secs)),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
