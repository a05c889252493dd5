// src/engine/job.rs

//! The unit of work flowing through the queue.

use std::fmt;

/// Unique, strictly increasing job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything needed to build a [`Job`] except its id.
///
/// Produced by rule matching with all placeholders already substituted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub display_name: String,
    pub command: String,
    pub args: Vec<String>,
    pub working_directory: Option<String>,
    pub pause_after_run: bool,
}

impl JobSpec {
    pub fn new(display_name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            command: command.into(),
            args: Vec::new(),
            working_directory: None,
            pause_after_run: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn working_directory(mut self, dir: impl Into<String>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn pause_after_run(mut self, pause: bool) -> Self {
        self.pause_after_run = pause;
        self
    }
}

/// One triggered execution. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    id: JobId,
    spec: JobSpec,
}

impl Job {
    /// Ids should come from [`crate::engine::EngineContext::create_job`] so
    /// they stay unique; this constructor is public for tests and fakes.
    pub fn new(id: JobId, spec: JobSpec) -> Self {
        Self { id, spec }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    pub fn command(&self) -> &str {
        &self.spec.command
    }

    pub fn args(&self) -> &[String] {
        &self.spec.args
    }

    pub fn working_directory(&self) -> Option<&str> {
        self.spec.working_directory.as_deref()
    }

    pub fn pause_after_run(&self) -> bool {
        self.spec.pause_after_run
    }
}

/// Lifecycle of a job inside the engine:
/// `Enqueued -> Running -> Completed | Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Enqueued,
    Running,
    Completed,
    Cancelled,
}

impl JobState {
    pub fn can_become(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Enqueued, JobState::Running)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled)
    }
}

/// How a job that left the `Running` state ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Process exited with status 0.
    Succeeded,
    /// Process ran and exited non-zero. Reported, not retried.
    NonZeroExit(i32),
    /// Process could not be started.
    LaunchFailure(String),
    /// Shutdown interrupted the job.
    Cancelled,
    /// Something unexpected went wrong while running the job (I/O error,
    /// panic). The worker keeps going.
    Faulted(String),
}

impl JobOutcome {
    /// Terminal state this outcome corresponds to.
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Cancelled => JobState::Cancelled,
            _ => JobState::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_machine_only_moves_forward() {
        assert!(JobState::Enqueued.can_become(JobState::Running));
        assert!(JobState::Running.can_become(JobState::Completed));
        assert!(JobState::Running.can_become(JobState::Cancelled));

        assert!(!JobState::Enqueued.can_become(JobState::Completed));
        assert!(!JobState::Completed.can_become(JobState::Running));
        assert!(!JobState::Cancelled.can_become(JobState::Enqueued));
    }

    #[test]
    fn outcomes_map_to_terminal_states() {
        assert_eq!(JobOutcome::NonZeroExit(2).state(), JobState::Completed);
        assert_eq!(JobOutcome::Cancelled.state(), JobState::Cancelled);
        assert!(JobOutcome::Succeeded.state().is_terminal());
    }
}
