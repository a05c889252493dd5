// src/logging.rs

//! Logging setup for `cliptrigger` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `CLIPTRIGGER_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Diagnostics go to STDERR through the same [`Console`] that prints the job
//! transcript: every record takes the console lock and closes an active
//! progress line before it is written, so log records never land on top of
//! an in-place progress row.

use std::io::{self, IsTerminal, Write};

use anyhow::Result;
use tracing_subscriber::fmt::{fmt, MakeWriter};

use crate::cli::LogLevel;
use crate::console::Console;

/// Environment variable consulted when `--log-level` is absent.
pub const LOG_ENV_VAR: &str = "CLIPTRIGGER_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV_VAR).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(ConsoleWriter::new(Console::stdout()))
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}

/// `MakeWriter` that routes formatted records through a [`Console`].
#[derive(Debug, Clone)]
pub struct ConsoleWriter {
    console: Console,
}

impl ConsoleWriter {
    pub fn new(console: Console) -> Self {
        Self { console }
    }
}

impl<'a> MakeWriter<'a> for ConsoleWriter {
    type Writer = ConsoleRecord;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleRecord {
            console: self.console.clone(),
            buf: Vec::new(),
        }
    }
}

/// One log record. Buffered and handed to the console in a single locked
/// write when dropped.
#[derive(Debug)]
pub struct ConsoleRecord {
    console: Console,
    buf: Vec<u8>,
}

impl Write for ConsoleRecord {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleRecord {
    fn drop(&mut self) {
        if !self.buf.is_empty() {
            self.console.diagnostic(&String::from_utf8_lossy(&self.buf));
        }
    }
}

/// Pick the effective level from the CLI flag and the env var value.
pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::MemoryTerminal;

    #[test]
    fn cli_flag_wins_over_env() {
        assert_eq!(
            resolve_level(Some(LogLevel::Warn), Some("trace")),
            tracing::Level::WARN
        );
    }

    #[test]
    fn env_value_is_used_without_flag() {
        assert_eq!(resolve_level(None, Some(" Debug ")), tracing::Level::DEBUG);
        assert_eq!(resolve_level(None, Some("warning")), tracing::Level::WARN);
    }

    #[test]
    fn unknown_or_missing_env_defaults_to_info() {
        assert_eq!(resolve_level(None, Some("loud")), tracing::Level::INFO);
        assert_eq!(resolve_level(None, None), tracing::Level::INFO);
    }

    #[test]
    fn records_close_the_progress_line_first() {
        let term = MemoryTerminal::new(40, 20);
        let console = Console::new(term.clone());
        let subscriber = fmt()
            .with_ansi(false)
            .without_time()
            .with_writer(ConsoleWriter::new(console.clone()))
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            console.progress("[download] 42%");
            tracing::info!("job enqueued");
            console.progress("[download] 43%");
            console.line("[Queue] Enqueued #2");
        });

        let lines = term.lines();
        assert_eq!(lines[0], "[download] 42%");
        assert_eq!(lines[1], "[download] 43%");
        assert_eq!(lines[2], "[Queue] Enqueued #2");
        assert!(term.errors().contains("job enqueued"));
        assert_eq!(term.errors().lines().count(), 1);
    }
}
