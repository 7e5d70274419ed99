//! Logging infrastructure for the livefile CLI.
//!
//! Library code in `livefile-core` only emits `tracing` events with structured
//! fields (`file`, `session`, `path`, `error`). This module installs the
//! subscriber that renders them.
//!
//! # Example
//!
//! ```rust,no_run
//! use livefile_cli::logger::init_logger;
//! use tracing::info;
//!
//! init_logger(false, false, false);
//! info!(file = "notes", "content changed");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "livefile=debug,livefile_core=debug,livefile_cli=debug";
const QUIET_FILTER: &str = "livefile=error,livefile_core=error,livefile_cli=error";
const DEFAULT_FILTER: &str = "livefile=info,livefile_core=info,livefile_cli=info";

/// Pick the filter for the given flags.
///
/// Order of precedence:
/// 1. `--verbose`: debug for the livefile crates
/// 2. `--quiet`: errors only
/// 3. `RUST_LOG`
/// 4. info for the livefile crates
pub fn build_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the tracing subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(build_filter(verbose, quiet), no_color);
}

/// Initialize the subscriber with an explicit filter.
///
/// ```rust,no_run
/// use livefile_cli::logger::init_logger_with_filter;
/// use tracing_subscriber::EnvFilter;
///
/// init_logger_with_filter(EnvFilter::new("livefile_core=trace"), true);
/// ```
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && crate::ui::should_use_color())
        .with_writer(std::io::stderr)
        .compact();

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
