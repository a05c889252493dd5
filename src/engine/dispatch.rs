// src/engine/dispatch.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::SourceEvent;
use crate::engine::context::EngineContext;
use crate::engine::job::JobId;
use crate::engine::queue::JobQueue;
use crate::watch::RuleSet;

/// Turns observed text into queued jobs.
///
/// This is the only consumer of the monitor's event channel; matching runs
/// here, off the monitor's task, and never waits on the worker.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    ctx: EngineContext,
    rules: Arc<RuleSet>,
    queue: JobQueue,
}

impl Dispatcher {
    pub fn new(ctx: EngineContext, rules: Arc<RuleSet>, queue: JobQueue) -> Self {
        Self { ctx, rules, queue }
    }

    /// Match `text` against every enabled rule and enqueue one job per match,
    /// in rule order. Returns the ids of the enqueued jobs.
    pub fn dispatch_text(&self, text: &str) -> Vec<JobId> {
        let specs = self.rules.match_text(text);
        if specs.is_empty() {
            debug!(len = text.len(), "observed text matched no rule");
            return Vec::new();
        }
        if self.queue.is_closed() {
            debug!("queue closed; ignoring observed text");
            return Vec::new();
        }

        let console = self.ctx.console();
        let mut ids = Vec::with_capacity(specs.len());

        for spec in specs {
            let job = self.ctx.create_job(spec);
            let id = job.id();
            let name = job.display_name().to_string();
            let waiting = self.queue.enqueue(job);

            info!(job_id = id.get(), name = %name, waiting, "job enqueued");
            console.line(&format!("[Queue] Enqueued {id}: {name}"));
            console.line(&format!("[Queue] Status: {waiting} waiting"));
            ids.push(id);
        }

        ids
    }

    /// Consume source events until the channel closes or shutdown is
    /// requested.
    pub async fn run(self, mut events: mpsc::Receiver<SourceEvent>, cancel: CancellationToken) {
        info!("dispatcher started");
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(SourceEvent::TextObserved(text)) => {
                        self.dispatch_text(&text);
                    }
                    None => {
                        debug!("source channel closed");
                        break;
                    }
                },
                _ = cancel.cancelled() => break,
            }
        }
        info!("dispatcher stopped");
    }
}
