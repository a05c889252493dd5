// src/engine/worker.rs

//! The single consumer of the job queue.
//!
//! Exactly one job runs at a time: the worker dequeues a job, runs it to
//! completion through the [`RunnerBackend`], reports the result, and only
//! then goes back to the queue. This keeps bandwidth- or resource-hungry
//! commands from competing with each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::console::{Console, StatusBoard};
use crate::engine::acknowledge::{Acknowledge, AutoAcknowledge};
use crate::engine::classify::{HeuristicPolicy, LineClass, LinePolicy};
use crate::engine::context::EngineContext;
use crate::engine::job::{Job, JobId, JobOutcome};
use crate::engine::queue::JobQueue;
use crate::engine::report::JobReporter;
use crate::errors::RunError;
use crate::exec::{RunRequest, RunnerBackend, command_line};

const ALREADY_DONE_MESSAGE: &str = "Already present, nothing to do.";
const PAUSE_PROMPT: &str = "Press any key to continue...";

/// What the worker did before it stopped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Number of jobs started.
    pub started: usize,
    /// Started jobs that ended in anything but [`JobOutcome::Succeeded`].
    pub unsuccessful: usize,
    /// Started jobs in start order with how they ended. Stays empty when the
    /// worker runs [`Worker::without_history`].
    pub finished: Vec<(JobId, JobOutcome)>,
    /// Jobs still queued at shutdown; never started.
    pub discarded: Vec<JobId>,
}

impl WorkerReport {
    fn record(&mut self, id: JobId, outcome: JobOutcome, keep: bool) {
        self.started += 1;
        if outcome != JobOutcome::Succeeded {
            self.unsuccessful += 1;
        }
        if keep {
            self.finished.push((id, outcome));
        }
    }

    pub fn started_ids(&self) -> Vec<JobId> {
        self.finished.iter().map(|(id, _)| *id).collect()
    }

    pub fn outcome_of(&self, id: JobId) -> Option<&JobOutcome> {
        self.finished
            .iter()
            .find(|(job_id, _)| *job_id == id)
            .map(|(_, outcome)| outcome)
    }
}

pub struct Worker {
    ctx: EngineContext,
    queue: JobQueue,
    runner: Arc<dyn RunnerBackend>,
    policy: Arc<dyn LinePolicy>,
    ack: Arc<dyn Acknowledge>,
    board: Option<StatusBoard>,
    keep_history: bool,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("queue", &self.queue)
            .field("status_board", &self.board.is_some())
            .finish_non_exhaustive()
    }
}

impl Worker {
    /// Worker with the default line policy and no pausing prompt
    /// (pauses are acknowledged immediately).
    pub fn new(
        ctx: EngineContext,
        queue: JobQueue,
        runner: Arc<dyn RunnerBackend>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            ctx,
            queue,
            runner,
            policy: Arc::new(HeuristicPolicy::default()),
            ack: Arc::new(AutoAcknowledge),
            board: None,
            keep_history: true,
            cancel,
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn LinePolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_acknowledger(mut self, ack: Arc<dyn Acknowledge>) -> Self {
        self.ack = ack;
        self
    }

    /// Give every job a slot on a status board under `heading`.
    pub fn with_status_board(mut self, heading: &str) -> Self {
        self.board = Some(self.ctx.console().status_board(heading));
        self
    }

    /// Only count outcomes; forget each job once its result is logged.
    ///
    /// For long-running workers, whose report would otherwise grow with
    /// every job ever run.
    pub fn without_history(mut self) -> Self {
        self.keep_history = false;
        self
    }

    pub fn spawn(self) -> JoinHandle<WorkerReport> {
        tokio::spawn(self.run())
    }

    /// Main worker loop.
    ///
    /// Runs until the queue is closed and drained, or until shutdown is
    /// requested. A cancelled job ends the loop; any other failure is
    /// reported and the loop moves on to the next job.
    pub async fn run(self) -> WorkerReport {
        info!("worker started");
        let console = self.ctx.console().clone();
        let mut report = WorkerReport::default();

        while let Some(job) = self.queue.next_job(&self.cancel).await {
            let id = job.id();
            self.ctx.mark_running(id);
            console.blank();
            console.line(&format!("===== Starting {id}: {} =====", job.display_name()));
            console.line(&format!("[Queue] {} still waiting", self.queue.len()));

            let outcome = self.execute(job).await;
            debug!(job_id = id.get(), ?outcome, "job finished");

            self.ctx.mark_finished(id, outcome.state());
            let cancelled = outcome == JobOutcome::Cancelled;
            report.record(id, outcome, self.keep_history);
            if cancelled {
                break;
            }

            console.line(&format!("[Queue] Done with {id}. {} waiting.", self.queue.len()));
        }

        if self.cancel.is_cancelled() {
            self.queue.close();
            report.discarded = self.queue.drain().iter().map(Job::id).collect();
            for id in &report.discarded {
                self.ctx.forget(*id);
            }
            if !report.discarded.is_empty() {
                console.line(&format!(
                    "[Queue] Shutdown: {} queued job(s) discarded.",
                    report.discarded.len()
                ));
            }
        }

        info!(
            started = report.started,
            unsuccessful = report.unsuccessful,
            discarded = report.discarded.len(),
            "worker stopped"
        );
        report
    }

    /// Run one job on its own task so a panic inside it is contained here.
    async fn execute(&self, job: Job) -> JobOutcome {
        let id = job.id();
        let task = JobTask {
            console: self.ctx.console().clone(),
            runner: Arc::clone(&self.runner),
            policy: Arc::clone(&self.policy),
            ack: Arc::clone(&self.ack),
            board: self.board.clone(),
            cancel: self.cancel.clone(),
        };

        match tokio::spawn(task.run(job)).await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(job_id = id.get(), error = %join_err, "job task failed");
                let console = self.ctx.console();
                console.end_progress();
                console.error_line(&format!("[Job {id}] Unhandled error: {join_err}"));
                JobOutcome::Faulted(join_err.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Everything one job needs, owned, so it can run on a spawned task.
struct JobTask {
    console: Console,
    runner: Arc<dyn RunnerBackend>,
    policy: Arc<dyn LinePolicy>,
    ack: Arc<dyn Acknowledge>,
    board: Option<StatusBoard>,
    cancel: CancellationToken,
}

impl JobTask {
    async fn run(self, job: Job) -> JobOutcome {
        let id = job.id();
        let mut reporter = JobReporter::new(self.console.clone(), id);
        if let Some(board) = &self.board {
            reporter = reporter.with_board(board, &format!("{id} {}", job.display_name()));
        }

        reporter.log(&format!("Command: {}", command_line(job.command(), job.args())));
        info!(
            job_id = id.get(),
            command = %job.command(),
            args = ?job.args(),
            "running job"
        );

        let already_reported = AtomicBool::new(false);
        let policy = self.policy.as_ref();

        let mut on_stdout = |line: &str| {
            handle_line(&reporter, policy, &already_reported, line, Stream::Stdout)
        };
        let mut on_stderr = |line: &str| {
            handle_line(&reporter, policy, &already_reported, line, Stream::Stderr)
        };

        let request = RunRequest {
            command: job.command(),
            args: job.args(),
            working_directory: job.working_directory(),
        };

        let result = self
            .runner
            .run(request, &self.cancel, &mut on_stdout, &mut on_stderr)
            .await;

        reporter.end_progress();

        let outcome = match result {
            Ok(output) => {
                reporter.log(&format!("Exit code: {}", output.exit_code));
                if output.success() {
                    reporter.finish("done");
                    JobOutcome::Succeeded
                } else {
                    let detail = if output.stderr.trim().is_empty() {
                        &output.stdout
                    } else {
                        &output.stderr
                    };
                    if !detail.trim().is_empty() {
                        reporter.log_err(detail);
                    }
                    reporter.finish(&format!("failed (exit code {})", output.exit_code));
                    JobOutcome::NonZeroExit(output.exit_code)
                }
            }
            Err(RunError::Cancelled) => {
                reporter.log("Cancelled.");
                reporter.finish("cancelled");
                return JobOutcome::Cancelled;
            }
            Err(err @ RunError::LaunchFailure { .. }) => {
                warn!(job_id = id.get(), error = %err, "job could not be started");
                reporter.log_err(&format!("Failed to start: {err}"));
                reporter.finish("failed to start");
                return JobOutcome::LaunchFailure(err.to_string());
            }
            Err(err @ RunError::Io { .. }) => {
                error!(job_id = id.get(), error = %err, "job failed while running");
                reporter.log_err(&format!("Unhandled error: {err}"));
                reporter.finish("error");
                return JobOutcome::Faulted(err.to_string());
            }
        };

        if job.pause_after_run() {
            self.pause(id).await;
        }

        outcome
    }

    /// Block the worker until the operator acknowledges. Every later job
    /// waits too. Shutdown ends the wait early.
    async fn pause(&self, id: JobId) {
        self.console.line(PAUSE_PROMPT);
        tokio::select! {
            res = self.ack.wait() => {
                if let Err(e) = res {
                    warn!(job_id = id.get(), error = %e, "waiting for acknowledgment failed; continuing");
                }
            }
            _ = self.cancel.cancelled() => {
                debug!(job_id = id.get(), "shutdown while paused");
            }
        }
    }
}

fn handle_line(
    reporter: &JobReporter,
    policy: &dyn LinePolicy,
    already_reported: &AtomicBool,
    line: &str,
    stream: Stream,
) {
    match policy.classify(line) {
        LineClass::AlreadyDone => {
            if !already_reported.swap(true, Ordering::Relaxed) {
                reporter.log(ALREADY_DONE_MESSAGE);
                reporter.status(ALREADY_DONE_MESSAGE);
            }
        }
        LineClass::Progress => reporter.progress(line),
        LineClass::Plain => match stream {
            Stream::Stdout => reporter.log(line),
            Stream::Stderr => reporter.log_err(line),
        },
    }
}
