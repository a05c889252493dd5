use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cliptrigger::engine::SourceEvent;
use cliptrigger::watch::{FileSource, TextSource, spawn_file_monitor, spawn_poll_monitor};

use crate::common::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

/// Hands out a fixed sequence of reads, then nothing.
struct ScriptedSource {
    reads: Mutex<VecDeque<anyhow::Result<Option<String>>>>,
}

impl ScriptedSource {
    fn new(reads: Vec<anyhow::Result<Option<String>>>) -> Self {
        Self {
            reads: Mutex::new(reads.into()),
        }
    }
}

impl TextSource for ScriptedSource {
    fn read_text(&self) -> anyhow::Result<Option<String>> {
        self.reads.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

async fn next_text(rx: &mut mpsc::Receiver<SourceEvent>) -> Option<String> {
    match with_timeout(rx.recv()).await {
        Some(SourceEvent::TextObserved(text)) => Some(text),
        None => None,
    }
}

#[tokio::test]
async fn poll_monitor_forwards_only_new_non_empty_text() -> TestResult {
    init_tracing();
    let source = Arc::new(ScriptedSource::new(vec![
        Ok(Some("a".into())),
        Ok(Some("a".into())),
        Ok(None),
        Err(anyhow!("clipboard busy")),
        Ok(Some(String::new())),
        Ok(Some("b".into())),
        Ok(Some("a".into())),
    ]));
    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();

    let handle = spawn_poll_monitor(source, Duration::from_millis(5), tx, cancel.clone());

    assert_eq!(next_text(&mut rx).await.as_deref(), Some("a"));
    assert_eq!(next_text(&mut rx).await.as_deref(), Some("b"));
    assert_eq!(next_text(&mut rx).await.as_deref(), Some("a"));

    cancel.cancel();
    with_timeout(handle.join()).await;
    // The sender was moved into the monitor; it is gone now.
    assert!(rx.recv().await.is_none());
    Ok(())
}

#[tokio::test]
async fn poll_monitor_stops_when_receiver_is_dropped() -> TestResult {
    let source = Arc::new(ScriptedSource::new(vec![Ok(Some("x".into()))]));
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let handle = spawn_poll_monitor(source, Duration::from_millis(5), tx, CancellationToken::new());
    with_timeout(handle.join()).await;
    Ok(())
}

#[tokio::test]
async fn file_monitor_reports_initial_content_and_changes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("buffer.txt");
    std::fs::write(&path, "first")?;

    let (tx, mut rx) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    let handle = spawn_file_monitor(FileSource::new(&path), tx, cancel.clone())?;

    assert_eq!(next_text(&mut rx).await.as_deref(), Some("first"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    std::fs::write(&path, "second")?;
    assert_eq!(next_text(&mut rx).await.as_deref(), Some("second"));

    cancel.cancel();
    with_timeout(handle.join()).await;
    Ok(())
}

#[test]
fn file_source_treats_a_missing_file_as_empty() -> TestResult {
    let dir = tempfile::tempdir()?;
    let source = FileSource::new(dir.path().join("nope.txt"));
    assert!(source.read_text()?.is_none());
    Ok(())
}

#[cfg(unix)]
#[test]
fn command_source_reads_stdout_and_ignores_failures() -> TestResult {
    use cliptrigger::watch::CommandSource;

    let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let ok = CommandSource::new(&owned(&["sh", "-c", "printf 'https://x.example'"]))?;
    assert_eq!(ok.read_text()?.as_deref(), Some("https://x.example"));

    let failing = CommandSource::new(&owned(&["sh", "-c", "exit 1"]))?;
    assert!(failing.read_text()?.is_none());

    assert!(CommandSource::new(&[]).is_err());
    Ok(())
}
