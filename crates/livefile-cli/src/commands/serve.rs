//! Serve command implementation.
//!
//! Loads configuration, starts the pipeline and runs until Ctrl+C. There is no
//! graceful drain: open sessions are dropped with the process.

use crate::app;
use crate::cli::ServeArgs;
use crate::config::{CliOverrides, LivefileConfig};
use crate::error::{Result, ResultExt};
use crate::ui;
use tokio::signal;

/// Execute the serve command.
///
/// # Errors
///
/// Returns errors for invalid configuration, a watcher that cannot start, or
/// an address that cannot be bound.
pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = LivefileConfig::load(args.config.as_deref(), &CliOverrides::from(&args))?;

    let mut server = app::launch(&config).await?;

    for file in server.watched() {
        ui::info(&format!(
            "Watching {} as '{}'",
            file.physical_path.display(),
            file.logical_id
        ));
    }
    for file in server.inert() {
        ui::warning(&format!(
            "Cannot watch {} ('{}'), it will never update",
            file.physical_path.display(),
            file.logical_id
        ));
    }

    let url = format!("http://{}", server.local_addr());
    ui::success(&format!("Serving {} (websocket at {})", url, config.ws_path));
    ui::info("Press Ctrl+C to stop");

    tokio::select! {
        signal = signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            ui::info("Shutting down...");
        }
        result = server.wait() => {
            result?;
            ui::error("Server stopped unexpectedly");
        }
    }

    Ok(())
}
