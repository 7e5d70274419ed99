//! Miette diagnostic conversion for CLI errors.

use crate::config::LivefileConfig;
use crate::error::{CliError, ConfigError};
use livefile_core::WatchError;
use miette::Report;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => config_error_to_miette(e),
        CliError::Watch(WatchError::Backend(source)) => miette::miette!(
            "Failed to start the file watcher: {}\n\nHint: Check the inotify/kqueue limits on this system",
            source
        ),
        _ => miette::miette!("{}", err),
    }
}

fn config_error_to_miette(err: ConfigError) -> Report {
    match err {
        ConfigError::MissingField { field, hint } if field == "files" => miette::miette!(
            "Missing required field: {}\n\nHint: {}\n\nExample livefile.toml:\n\n{}",
            field,
            hint,
            LivefileConfig::example_toml()
        ),
        ConfigError::MissingField { field, hint } => {
            miette::miette!("Missing required field: {}\n\nHint: {}", field, hint)
        }
        _ => miette::miette!("Configuration error: {}", err),
    }
}
