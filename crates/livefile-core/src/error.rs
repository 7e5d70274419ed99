//! Error types for the change-detection and broadcast pipeline.
//!
//! None of these errors is fatal to the process except [`WatchError::Backend`],
//! which means the underlying watch primitive could not be constructed at all.
//! Every other variant is scoped to a single file or a single session and is
//! logged where it happens.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while arming or maintaining file watches.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The raw watch primitive could not be created.
    #[error("Failed to initialize file watcher: {0}")]
    Backend(#[source] notify::Error),

    /// A physical path could not be watched (missing path, permissions).
    ///
    /// The affected file stays inert for the rest of the run.
    #[error("Cannot watch {}: {source}", .path.display())]
    Setup {
        /// Physical path that failed to arm
        path: PathBuf,
        /// Error reported by the watch primitive
        #[source]
        source: notify::Error,
    },

    /// The same physical path or logical id was registered twice.
    #[error("Duplicate watch target: {0}")]
    Duplicate(String),
}

/// A watched file could not be read at broadcast time.
#[derive(Debug, Error)]
#[error("Failed to read {}: {source}", .path.display())]
pub struct ReadError {
    /// Physical path that failed to read
    pub path: PathBuf,
    /// Underlying I/O error
    #[source]
    pub source: std::io::Error,
}

/// Reasons a client session is torn down.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectionError {
    /// The protocol upgrade never completed.
    #[error("upgrade failed: {0}")]
    Upgrade(String),

    /// Reading the next inbound frame failed.
    #[error("read failed: {0}")]
    Read(String),

    /// Writing an outbound frame failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The outbox overflowed under the disconnect policy.
    #[error("client too slow, outbox full")]
    SlowConsumer,

    /// The client sent a close frame or ended the stream.
    #[error("closed by peer")]
    ClosedByPeer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_error_mentions_path() {
        let err = WatchError::Setup {
            path: PathBuf::from("./notes.md"),
            source: notify::Error::path_not_found(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Cannot watch"));
        assert!(msg.contains("notes.md"));
    }

    #[test]
    fn test_read_error_mentions_path() {
        let err = ReadError {
            path: PathBuf::from("/tmp/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/tmp/missing"));
    }

    #[test]
    fn test_connection_error_display() {
        assert_eq!(
            ConnectionError::Write("broken pipe".into()).to_string(),
            "write failed: broken pipe"
        );
        assert_eq!(ConnectionError::ClosedByPeer.to_string(), "closed by peer");
    }
}
