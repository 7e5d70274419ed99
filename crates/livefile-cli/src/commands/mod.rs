//! Command implementations for the livefile CLI.
//!
//! - [`serve`] - Watch files and push them to connected browsers
//! - [`check`] - Configuration validation
//!
//! Each command provides an `execute` function that takes the parsed command
//! arguments and returns a Result.

pub mod check;
pub mod serve;

pub use check::execute as check_execute;
pub use serve::execute as serve_execute;
