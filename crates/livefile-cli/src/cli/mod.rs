//! Command-line interface definition for livefile.
//!
//! # Command Structure
//!
//! - `livefile serve` - Watch files and push their content to browsers
//! - `livefile check` - Validate configuration and report watched files

mod commands;
pub mod enums;
mod validation;

use clap::Parser;

pub use commands::{CheckArgs, Command, ServeArgs};
pub use enums::*;
pub use validation::parse_watch_spec;

/// livefile - live view of text files in the browser
#[derive(Parser, Debug)]
#[command(
    name = "livefile",
    version,
    about = "Push watched text files to browsers over WebSocket",
    long_about = "livefile watches a fixed set of text files and sends their full content\n\
                  to every connected browser whenever one changes. Editor saves that\n\
                  rename or replace the file are followed transparently."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    ///
    /// Shows raw watch events, re-arms and per-session traffic.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
