use clap::{Args, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cli::enums::Overflow;
use crate::cli::validation::parse_watch_spec;
use crate::config::FileEntry;

/// Available livefile subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the server and watch files
    ///
    /// Serves the static client, accepts WebSocket connections and pushes the
    /// full content of a file to every client each time it changes. Runs until
    /// Ctrl+C.
    Serve(ServeArgs),

    /// Validate configuration without starting the server
    ///
    /// Loads livefile.toml, environment and arguments exactly like `serve`,
    /// then lists every watched file and whether it exists right now.
    Check(CheckArgs),
}

/// Arguments for the serve command
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Files to watch, optionally with a logical id
    ///
    /// The id defaults to the file name. Arguments replace the `files` list
    /// from the config file.
    ///
    /// Examples:
    ///   livefile serve notes.md
    ///   livefile serve drafts/today.md=today README.md=readme
    #[arg(value_name = "FILE[=ID]", value_parser = parse_watch_spec)]
    pub files: Vec<FileEntry>,

    /// Address to listen on
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Directory served as static assets
    ///
    /// Falls back to the built-in client for files it does not contain.
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Path to a config file (default: ./livefile.toml when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// What to do when a client falls behind
    ///
    /// - drop-oldest: discard the oldest queued update
    /// - drop-newest: discard the incoming update
    /// - disconnect: close the slow client
    #[arg(long, value_enum, value_name = "POLICY")]
    pub overflow: Option<Overflow>,

    /// Updates queued per client before the overflow policy applies
    #[arg(long, value_name = "N")]
    pub queue_capacity: Option<usize>,
}

/// Arguments for the check command
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Files to watch, optionally with a logical id
    #[arg(value_name = "FILE[=ID]", value_parser = parse_watch_spec)]
    pub files: Vec<FileEntry>,

    /// Path to a config file (default: ./livefile.toml when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
