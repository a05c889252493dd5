#![allow(dead_code)]

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use cliptrigger::console::{Console, MemoryTerminal};
use cliptrigger::engine::{EngineContext, JobId, JobQueue, JobSpec, Worker, WorkerReport};

pub use cliptrigger_test_utils::builders;
pub use cliptrigger_test_utils::{
    FakeRunner, RecordingAcknowledger, Script, init_tracing, with_timeout,
};

/// Engine wired to a `FakeRunner` and an in-memory screen.
pub struct Harness {
    pub ctx: EngineContext,
    pub queue: JobQueue,
    pub runner: FakeRunner,
    pub term: MemoryTerminal,
    pub cancel: CancellationToken,
}

impl Harness {
    pub fn new(runner: FakeRunner) -> Self {
        init_tracing();
        let term = MemoryTerminal::new(100, 500);
        Self {
            ctx: EngineContext::new(Console::new(term.clone())),
            queue: JobQueue::new(),
            runner,
            term,
            cancel: CancellationToken::new(),
        }
    }

    pub fn worker(&self) -> Worker {
        Worker::new(
            self.ctx.clone(),
            self.queue.clone(),
            Arc::new(self.runner.clone()),
            self.cancel.clone(),
        )
    }

    pub fn spawn_worker(&self) -> JoinHandle<WorkerReport> {
        self.worker().spawn()
    }

    pub fn enqueue(&self, spec: JobSpec) -> JobId {
        let job = self.ctx.create_job(spec);
        let id = job.id();
        self.queue.enqueue(job);
        id
    }

    /// Screen content, one entry per row, trailing blanks trimmed.
    pub fn output(&self) -> Vec<String> {
        self.term.lines()
    }

    pub fn output_contains(&self, needle: &str) -> bool {
        self.output().iter().any(|l| l.contains(needle))
    }

    /// Index of the first screen row containing `needle`.
    pub fn row_of(&self, needle: &str) -> Option<usize> {
        self.output().iter().position(|l| l.contains(needle))
    }
}

/// `JobSpec` running `command` with a single argument.
pub fn spec(name: &str, command: &str, arg: &str) -> JobSpec {
    JobSpec::new(name, command).args([arg])
}
