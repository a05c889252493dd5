// src/engine/context.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::console::Console;
use crate::engine::job::{Job, JobId, JobSpec, JobState};

/// Shared state handed to every component that prints or creates jobs.
///
/// Holds the one console (and with it the one output lock), the job id
/// counter and the lifecycle state of every job that is still alive. Cloning
/// is cheap and shares all three.
#[derive(Debug, Clone)]
pub struct EngineContext {
    console: Console,
    next_id: Arc<AtomicU64>,
    states: Arc<Mutex<HashMap<JobId, JobState>>>,
}

impl EngineContext {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            next_id: Arc::new(AtomicU64::new(1)),
            states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Allocate the next job id. Ids start at 1 and never repeat.
    pub fn next_job_id(&self) -> JobId {
        JobId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Create a job in the `Enqueued` state.
    pub fn create_job(&self, spec: JobSpec) -> Job {
        let job = Job::new(self.next_job_id(), spec);
        self.lock_states().insert(job.id(), JobState::Enqueued);
        job
    }

    /// Current state of a live job. `None` once the job has finished (its
    /// result is logged and it is dropped) or was discarded.
    pub fn job_state(&self, id: JobId) -> Option<JobState> {
        self.lock_states().get(&id).copied()
    }

    /// Number of jobs currently `Running`.
    pub fn running_count(&self) -> usize {
        self.lock_states()
            .values()
            .filter(|state| **state == JobState::Running)
            .count()
    }

    pub(crate) fn mark_running(&self, id: JobId) {
        self.transition(id, JobState::Running);
    }

    /// Record the terminal state and forget the job.
    pub(crate) fn mark_finished(&self, id: JobId, state: JobState) {
        self.transition(id, state);
    }

    /// Drop a job that never started.
    pub(crate) fn forget(&self, id: JobId) {
        self.lock_states().remove(&id);
    }

    fn transition(&self, id: JobId, to: JobState) {
        let mut states = self.lock_states();
        let from = states.get(&id).copied();

        // Jobs built with `Job::new` were never registered.
        if let Some(from) = from {
            if !from.can_become(to) {
                warn!(job_id = id.get(), ?from, ?to, "unexpected job state change");
            }
        }

        if to.is_terminal() {
            states.remove(&id);
        } else {
            states.insert(id, to);
        }
        debug!(job_id = id.get(), ?from, ?to, "job state changed");
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<JobId, JobState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
