//! Configuration for livefile with multi-source loading.
//!
//! Merges settings from CLI args, environment variables, and `livefile.toml`.
//! Priority: CLI > Environment (`LIVEFILE_*`) > File > Defaults
//!
//! Configuration is read once at startup and never reloaded.

mod conversions;
mod defaults;
mod loading;
mod types;
mod validation;

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use livefile_core::OverflowPolicy;

pub use defaults::*;
pub use loading::CliOverrides;
pub use types::*;

/// livefile configuration - loaded from livefile.toml, environment, or CLI args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LivefileConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Directory served as static assets
    #[serde(default = "default_static_root")]
    pub static_root: PathBuf,

    /// Route that upgrades to WebSocket
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    /// Watched files
    #[serde(default)]
    pub files: Vec<FileEntry>,

    /// Delay before re-arming a watch after a remove or rename
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Per-client outbox bound
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// What a full outbox does
    #[serde(default)]
    pub overflow: OverflowPolicy,

    /// Keep-alive ping period in seconds, 0 disables
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    /// Deadline for plain HTTP requests
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Answer a client's `{"file": id}` message with the current content
    #[serde(default = "default_snapshot_on_subscribe")]
    pub snapshot_on_subscribe: bool,
}

impl Default for LivefileConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_root: default_static_root(),
            ws_path: default_ws_path(),
            files: Vec::new(),
            settle_delay_ms: default_settle_delay_ms(),
            queue_capacity: default_queue_capacity(),
            overflow: OverflowPolicy::default(),
            ping_interval_secs: default_ping_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
            snapshot_on_subscribe: default_snapshot_on_subscribe(),
        }
    }
}

impl LivefileConfig {
    /// Example livefile.toml content.
    pub fn example_toml() -> &'static str {
        r#"bind = "127.0.0.1:8000"
static_root = "html"
overflow = "drop-oldest"

[[files]]
path = "notes.md"
id = "notes"
"#
    }
}
