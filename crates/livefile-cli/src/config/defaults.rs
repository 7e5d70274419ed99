use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "livefile.toml";

/// Prefix for environment overrides (`LIVEFILE_BIND`, ...).
pub const ENV_PREFIX: &str = "LIVEFILE_";

pub fn default_bind() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8000))
}

pub fn default_static_root() -> PathBuf {
    PathBuf::from("html")
}

pub fn default_ws_path() -> String {
    "/ws".to_string()
}

pub fn default_settle_delay_ms() -> u64 {
    livefile_core::DEFAULT_SETTLE_DELAY.as_millis() as u64
}

pub fn default_queue_capacity() -> usize {
    livefile_core::DEFAULT_QUEUE_CAPACITY
}

pub fn default_ping_interval_secs() -> u64 {
    livefile_core::DEFAULT_PING_INTERVAL.as_secs()
}

pub fn default_request_timeout_ms() -> u64 {
    1000
}

pub fn default_snapshot_on_subscribe() -> bool {
    true
}
