//! Check command implementation.
//!
//! Validates configuration without starting the server.

use crate::cli::CheckArgs;
use crate::config::{CliOverrides, LivefileConfig};
use crate::error::{CliError, Result, ResultExt};
use crate::ui;

/// Execute the check command.
///
/// Missing files are reported but do not fail the check: the server starts
/// without them and they stay inert.
///
/// # Errors
///
/// Returns errors for configuration that cannot be loaded or is invalid.
pub async fn execute(args: CheckArgs) -> Result<()> {
    ui::info("Checking configuration...");

    let config = LivefileConfig::load(args.config.as_deref(), &CliOverrides::from(&args))?;
    ui::success("Configuration is valid");

    let files = config
        .watched_files()
        .with_hint("Give every watched file its own path and id")?;
    let mut missing = 0;
    for file in files.iter() {
        let path = &file.physical_path;
        match tokio::fs::metadata(path).await.with_path(path) {
            Ok(meta) => ui::success(&format!(
                "  {} -> '{}' ({} bytes)",
                path.display(),
                file.logical_id,
                meta.len()
            )),
            Err(CliError::FileNotFound(_)) => {
                missing += 1;
                ui::warning(&format!(
                    "  {} -> '{}' (not found)",
                    path.display(),
                    file.logical_id
                ));
            }
            Err(e) => {
                missing += 1;
                ui::warning(&format!("  {} -> '{}' ({})", path.display(), file.logical_id, e));
            }
        }
    }

    if !config.static_root.is_dir() {
        ui::info(&format!(
            "Static root {} not found, the built-in client will be served",
            config.static_root.display()
        ));
    }

    ui::info(&format!(
        "{} file(s), {} missing; listening on {} with {} overflow",
        files.len(),
        missing,
        config.bind,
        config.overflow
    ));

    Ok(())
}
