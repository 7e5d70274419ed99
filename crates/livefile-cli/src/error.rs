//! Error handling for the livefile CLI.
//!
//! The hierarchy mirrors how failures surface to a user:
//! - **Top-level errors** (`CliError`) are what commands return
//! - **Configuration errors** (`ConfigError`) explain what to fix and where
//! - **Context helpers** (`ResultExt`) attach paths and hints on the way up
//!
//! Runtime failures inside the pipeline (a file that cannot be read, a client
//! that disconnects) never reach this layer; they are logged where they happen.
//!
//! # Example
//!
//! ```rust,no_run
//! use livefile_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read_settings(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Pass --config to point at another file")
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use livefile_core::WatchError;
use thiserror::Error;

mod miette;

pub use self::miette::cli_error_to_miette;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The listener could not bind
    #[error("Failed to bind to {addr}: {source}\n\nHint: Pick another address with --bind")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error
    #[error("Server error: {0}")]
    Server(String),

    /// File watching could not be set up
    #[error("File watcher error: {0}")]
    Watch(#[from] WatchError),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}\n\nHint: Create a livefile.toml or drop --config", .0.display())]
    NotFound(PathBuf),

    /// The merged sources could not be parsed into a configuration
    #[error("Invalid configuration: {0}\n\nHint: Check livefile.toml syntax and LIVEFILE_* variables")]
    Parse(String),

    /// Missing required configuration field
    #[error("Missing required field: {field}\n\nHint: {hint}")]
    MissingField {
        /// Name of the missing field
        field: String,
        /// Helpful hint for providing the field
        hint: String,
    },

    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The invalid value
        value: String,
        /// Helpful hint for correct values
        hint: String,
    },

    /// Two watched files share an id or a path
    #[error("Duplicate {kind} '{value}'\n\nHint: Every watched file needs its own path and id")]
    Duplicate {
        /// `id` or `path`
        kind: &'static str,
        /// The repeated value
        value: String,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for adding context to `Result` types.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint line to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}
