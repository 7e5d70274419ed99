//! Terminal output for humans.
//!
//! Status lines (startup banner, watched files, fatal errors) go to stderr with
//! a colored glyph. Structured runtime logging goes through `tracing` instead;
//! see [`crate::logger`].

mod messages;

pub use messages::{error, info, success, warning};

use std::sync::atomic::{AtomicBool, Ordering};

static COLOR_DISABLED: AtomicBool = AtomicBool::new(false);

/// Check if color output should be enabled.
///
/// `--no-color` and `NO_COLOR` win over `FORCE_COLOR`, which wins over
/// terminal detection on stderr.
pub fn should_use_color() -> bool {
    if COLOR_DISABLED.load(Ordering::Relaxed) || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }

    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }

    console::user_attended_stderr()
}

/// Apply the `--no-color` flag and the environment to terminal output.
///
/// Call early in `main`, before anything is printed.
pub fn init_colors(no_color: bool) {
    COLOR_DISABLED.store(no_color, Ordering::Relaxed);
}
