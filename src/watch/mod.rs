// src/watch/mod.rs

//! Watching the shared text buffer and matching it against rules.
//!
//! This module is responsible for:
//! - Compiling `[[rule]]` patterns into a [`RuleSet`].
//! - Reading the buffer through a [`TextSource`] (a clipboard command or a
//!   plain file).
//! - Turning *changes* of that buffer into [`SourceEvent`]s.
//!
//! It does **not** know about jobs or the queue; the dispatcher turns events
//! into jobs.
//!
//! [`SourceEvent`]: crate::engine::SourceEvent

pub mod monitor;
pub mod rules;
pub mod source;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::SourceConfig;
use crate::engine::SourceEvent;

pub use monitor::{ChangeFilter, MonitorHandle, spawn_file_monitor, spawn_poll_monitor};
pub use rules::{MatchRule, RuleSet};
pub use source::{CommandSource, FileSource, TextSource};

/// Start the monitor described by `[source]`.
pub fn spawn_monitor(
    source: &SourceConfig,
    poll_interval: Duration,
    events: mpsc::Sender<SourceEvent>,
    cancel: CancellationToken,
) -> Result<MonitorHandle> {
    match source {
        SourceConfig::Command { cmd } => {
            let source = Arc::new(CommandSource::new(cmd)?);
            Ok(spawn_poll_monitor(source, poll_interval, events, cancel))
        }
        SourceConfig::File { path } => spawn_file_monitor(FileSource::new(path), events, cancel),
    }
}
