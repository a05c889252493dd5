// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cliptrigger`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cliptrigger",
    version,
    about = "Run commands, one at a time, for text that shows up on the clipboard.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Cliptrigger.toml` in the current working directory, or
    /// `CLIPTRIGGER_CONFIG` if set.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CLIPTRIGGER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the rules, but don't watch or run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Dispatch TEXT once as if it had been copied, run the matching jobs,
    /// then exit. The source is not watched.
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
