use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cliptrigger::engine::acknowledge::{AckFuture, Acknowledge};
use tokio::sync::Notify;

/// Counts pauses and, when gated, holds each one until [`release`] is called.
///
/// [`release`]: RecordingAcknowledger::release
#[derive(Debug, Clone, Default)]
pub struct RecordingAcknowledger {
    waits: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl RecordingAcknowledger {
    /// Acknowledges immediately, only counting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pause blocks until `release()`.
    pub fn gated() -> Self {
        Self {
            waits: Arc::default(),
            gate: Some(Arc::new(Notify::new())),
        }
    }

    /// Number of pauses entered so far.
    pub fn waits(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }

    /// Let one pending (or the next) pause through.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }
}

impl Acknowledge for RecordingAcknowledger {
    fn wait(&self) -> AckFuture<'_> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                gate.notified().await;
            }
            Ok(())
        })
    }
}
