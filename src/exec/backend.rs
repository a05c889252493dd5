// src/exec/backend.rs

//! Pluggable runner backend abstraction.
//!
//! The worker talks to a `RunnerBackend` instead of spawning processes
//! itself. Production uses [`ProcessRunner`]; tests can provide a scripted
//! backend that records start order and emits canned output lines without
//! touching the OS.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::errors::RunError;
use crate::exec::runner::{LineSink, ProcessRunner, RunOutput, RunRequest};

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<RunOutput, RunError>> + Send + 'a>>;

/// Trait abstracting how a single job's command is executed.
pub trait RunnerBackend: Send + Sync {
    /// Run one command to completion (or cancellation).
    ///
    /// `on_stdout` / `on_stderr` must be invoked once per completed line, in
    /// order, while the command is still running.
    fn run<'a>(
        &'a self,
        request: RunRequest<'a>,
        cancel: &'a CancellationToken,
        on_stdout: LineSink<'a>,
        on_stderr: LineSink<'a>,
    ) -> RunFuture<'a>;
}

impl RunnerBackend for ProcessRunner {
    fn run<'a>(
        &'a self,
        request: RunRequest<'a>,
        cancel: &'a CancellationToken,
        on_stdout: LineSink<'a>,
        on_stderr: LineSink<'a>,
    ) -> RunFuture<'a> {
        Box::pin(ProcessRunner::run(self, request, cancel, on_stdout, on_stderr))
    }
}
