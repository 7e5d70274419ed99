//! livefile CLI - push watched text files to browsers over WebSocket.
//!
//! This crate puts an HTTP and WebSocket surface on the `livefile-core`
//! pipeline and exposes it as the `livefile` binary.
//!
//! # Architecture
//!
//! - [`cli`] - Argument parsing with clap
//! - [`config`] - Layered configuration (defaults, livefile.toml, env, CLI)
//! - [`app`] - Starts the watcher, broadcaster and server together
//! - [`server`] - axum router: upgrade route and static assets
//! - [`commands`] - `serve` and `check`
//! - [`error`] - Error types with actionable messages
//! - [`logger`] - Structured logging with tracing
//! - [`ui`] - Status lines for the terminal
//!
//! # Example
//!
//! ```rust,no_run
//! use livefile_cli::app;
//! use livefile_cli::config::{FileEntry, LivefileConfig};
//!
//! # async fn run() -> livefile_cli::Result<()> {
//! let config = LivefileConfig {
//!     files: vec![FileEntry::with_id("notes.md", "notes")],
//!     ..LivefileConfig::default()
//! };
//! config.validate()?;
//!
//! let mut server = app::launch(&config).await?;
//! println!("listening on {}", server.local_addr());
//! server.wait().await
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod server;
pub mod ui;

pub use error::{CliError, ConfigError, Result, ResultExt};
