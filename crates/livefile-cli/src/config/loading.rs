use crate::cli::{CheckArgs, ServeArgs};
use crate::config::{DEFAULT_CONFIG_FILE, ENV_PREFIX, FileEntry, LivefileConfig};
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use livefile_core::OverflowPolicy;
use serde::Serialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Scalar fields that may be set from `LIVEFILE_*` variables.
const ENV_KEYS: &[&str] = &[
    "bind",
    "static_root",
    "ws_path",
    "settle_delay_ms",
    "queue_capacity",
    "overflow",
    "ping_interval_secs",
    "request_timeout_ms",
    "snapshot_on_subscribe",
];

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overflow: Option<OverflowPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
}

impl From<&ServeArgs> for CliOverrides {
    fn from(args: &ServeArgs) -> Self {
        Self {
            files: (!args.files.is_empty()).then(|| args.files.clone()),
            bind: args.bind,
            static_root: args.root.clone(),
            overflow: args.overflow.map(Into::into),
            queue_capacity: args.queue_capacity,
        }
    }
}

impl From<&CheckArgs> for CliOverrides {
    fn from(args: &CheckArgs) -> Self {
        Self {
            files: (!args.files.is_empty()).then(|| args.files.clone()),
            ..Self::default()
        }
    }
}

impl LivefileConfig {
    /// Load configuration from every source and validate it.
    /// Priority: CLI args > environment variables > config file > defaults
    pub fn load(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let config: Self = Self::figment(config_path, overrides)?
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Build the layered figment without extracting it.
    pub fn figment(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        // An explicit --config must exist; the default file is optional
        let config_file = match config_path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::NotFound(path.to_path_buf()).into());
            }
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                default_path.exists().then(|| default_path.to_path_buf())
            }
        };

        if let Some(path) = config_file {
            tracing::debug!(path = %path.display(), "loading config file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).filter(|key| {
            ENV_KEYS
                .iter()
                .any(|known| key.as_str().eq_ignore_ascii_case(known))
        }));

        Ok(figment.merge(Serialized::defaults(overrides)))
    }
}
