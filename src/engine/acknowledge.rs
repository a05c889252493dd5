// src/engine/acknowledge.rs

//! Waiting for the operator after a job with `pause_after_run`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const KEY_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub type AckFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

/// Something that resolves once the operator has acknowledged a paused job.
pub trait Acknowledge: Send + Sync {
    fn wait(&self) -> AckFuture<'_>;
}

/// Waits for a single key press on the controlling terminal.
///
/// Raw mode is enabled while waiting, which also means `Ctrl-C` arrives as a
/// key event rather than a signal; it is turned into a shutdown request on
/// `cancel`.
#[derive(Debug, Clone)]
pub struct KeyPressAcknowledger {
    cancel: CancellationToken,
}

impl KeyPressAcknowledger {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl Acknowledge for KeyPressAcknowledger {
    fn wait(&self) -> AckFuture<'_> {
        let cancel = self.cancel.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || wait_for_key(&cancel))
                .await
                .context("key press reader task failed")?
        })
    }
}

fn wait_for_key(cancel: &CancellationToken) -> Result<()> {
    terminal::enable_raw_mode().context("enabling raw mode")?;
    let res = poll_key(cancel);
    if let Err(e) = terminal::disable_raw_mode() {
        debug!(error = %e, "disabling raw mode failed");
    }
    res
}

fn poll_key(cancel: &CancellationToken) -> Result<()> {
    // Polling with a timeout keeps this blocking thread responsive to
    // shutdown; a plain `event::read` could outlive the runtime.
    while !cancel.is_cancelled() {
        if !event::poll(KEY_POLL_INTERVAL).context("polling terminal events")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("reading terminal event")? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                debug!("Ctrl-C pressed while paused; requesting shutdown");
                cancel.cancel();
            }
            return Ok(());
        }
    }
    Ok(())
}

/// Acknowledges immediately. Used when there is no interactive terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoAcknowledge;

impl Acknowledge for AutoAcknowledge {
    fn wait(&self) -> AckFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}
