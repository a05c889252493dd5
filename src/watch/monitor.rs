// src/watch/monitor.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::SourceEvent;
use crate::watch::source::{FileSource, TextSource};

/// Suppresses empty text and repeats of the last text seen.
#[derive(Debug, Default)]
pub struct ChangeFilter {
    last: Option<String>,
}

impl ChangeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the text if it is new, `None` if it should be ignored.
    pub fn observe(&mut self, text: String) -> Option<String> {
        if text.is_empty() || self.last.as_deref() == Some(text.as_str()) {
            return None;
        }
        self.last = Some(text.clone());
        Some(text)
    }
}

/// Handle for a running monitor.
///
/// Keeps the `notify` watcher (if any) alive; dropping the handle stops file
/// watching. The polling task itself stops on cancellation.
pub struct MonitorHandle {
    task: JoinHandle<()>,
    _watcher: Option<RecommendedWatcher>,
}

impl std::fmt::Debug for MonitorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorHandle")
            .field("finished", &self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl MonitorHandle {
    /// Wait for the monitor task to end.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "monitor task failed");
        }
    }
}

/// Poll `source` every `interval` and send each new text to `events`.
///
/// The current content at startup counts as new.
pub fn spawn_poll_monitor<S>(
    source: Arc<S>,
    interval: Duration,
    events: mpsc::Sender<SourceEvent>,
    cancel: CancellationToken,
) -> MonitorHandle
where
    S: TextSource + 'static,
{
    info!(source = %source.describe(), ?interval, "polling text source");

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut filter = ChangeFilter::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = cancel.cancelled() => break,
            }

            if !read_and_forward(Arc::clone(&source), &mut filter, &events).await {
                break;
            }
        }

        debug!("poll monitor ended");
    });

    MonitorHandle {
        task,
        _watcher: None,
    }
}

/// Watch `source`'s file with `notify` and send its content whenever it
/// changes (plus once at startup).
pub fn spawn_file_monitor(
    source: FileSource,
    events: mpsc::Sender<SourceEvent>,
    cancel: CancellationToken,
) -> Result<MonitorHandle> {
    let path = absolute(source.path());
    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = path.file_name().map(|n| n.to_os_string());

    // Channel from the blocking notify callback into the async world.
    let (change_tx, mut change_rx) = mpsc::unbounded_channel::<()>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                if ours {
                    // Receiver gone means the monitor stopped; nothing to do.
                    let _ = change_tx.send(());
                }
            }
            Err(err) => {
                // We can't log via tracing reliably here, so fall back to stderr.
                eprintln!("cliptrigger: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {:?}", dir))?;

    info!(path = %path.display(), "watching text file");

    let source = Arc::new(source);
    let task = tokio::spawn(async move {
        let mut filter = ChangeFilter::new();

        if !read_and_forward(Arc::clone(&source), &mut filter, &events).await {
            return;
        }

        loop {
            tokio::select! {
                change = change_rx.recv() => {
                    if change.is_none() {
                        break;
                    }
                }
                _ = cancel.cancelled() => break,
            }

            // One save often produces a burst of events; collapse them.
            while change_rx.try_recv().is_ok() {}

            if !read_and_forward(Arc::clone(&source), &mut filter, &events).await {
                break;
            }
        }

        debug!("file monitor ended");
    });

    Ok(MonitorHandle {
        task,
        _watcher: Some(watcher),
    })
}

/// Read once and forward new text. Returns `false` when the receiving side
/// is gone and the monitor should stop.
async fn read_and_forward<S>(
    source: Arc<S>,
    filter: &mut ChangeFilter,
    events: &mpsc::Sender<SourceEvent>,
) -> bool
where
    S: TextSource + 'static,
{
    let read = tokio::task::spawn_blocking(move || source.read_text()).await;

    let text = match read {
        Ok(Ok(Some(text))) => text,
        Ok(Ok(None)) => return true,
        Ok(Err(e)) => {
            // Transient (clipboard busy, file mid-write); retry next time.
            debug!(error = %e, "reading text source failed");
            return true;
        }
        Err(e) => {
            warn!(error = %e, "text source reader panicked");
            return true;
        }
    };

    let Some(text) = filter.observe(text) else {
        return true;
    };

    debug!(len = text.len(), "new text observed");
    if events.send(SourceEvent::TextObserved(text)).await.is_err() {
        debug!("source event channel closed");
        return false;
    }
    true
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
