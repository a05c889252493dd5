// src/engine/queue.rs

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::job::Job;

#[derive(Debug, Default)]
struct QueueState {
    jobs: VecDeque<Job>,
    /// No more jobs will be enqueued; the consumer exits once drained.
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    available: Notify,
}

/// Unbounded FIFO of jobs with many producers and a single consumer.
///
/// Semantics:
/// - `enqueue` appends at the tail and wakes the consumer. It never blocks
///   on the consumer and is safe to call from any number of tasks.
/// - `next_job` hands out jobs strictly in enqueue order; each job is
///   handed out exactly once.
/// - After `close`, `next_job` keeps returning the remaining jobs and then
///   `None`.
/// - Once the cancellation token fires, `next_job` returns `None` without
///   dequeuing anything; whatever is still queued is left for `drain`.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    shared: Arc<Shared>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `job` and return the number of jobs now waiting.
    ///
    /// Jobs enqueued after `close` are dropped.
    pub fn enqueue(&self, job: Job) -> usize {
        let waiting = {
            let mut state = self.lock();
            if state.closed {
                debug!(job_id = job.id().get(), "queue closed; dropping job");
                return state.jobs.len();
            }
            state.jobs.push_back(job);
            state.jobs.len()
        };
        // `notify_one` stores a permit when nobody is waiting yet, so a
        // wake-up between the consumer's check and its wait is not lost.
        self.shared.available.notify_one();
        waiting
    }

    /// Wait for the next job.
    ///
    /// Returns `None` when shutdown was requested or the queue is closed and
    /// empty.
    pub async fn next_job(&self, cancel: &CancellationToken) -> Option<Job> {
        loop {
            if cancel.is_cancelled() {
                return None;
            }

            {
                let mut state = self.lock();
                if let Some(job) = state.jobs.pop_front() {
                    return Some(job);
                }
                if state.closed {
                    return None;
                }
            }

            tokio::select! {
                _ = self.shared.available.notified() => {}
                _ = cancel.cancelled() => return None,
            }
        }
    }

    /// Non-blocking dequeue.
    pub fn try_next_job(&self) -> Option<Job> {
        self.lock().jobs.pop_front()
    }

    /// Stop accepting jobs. The consumer finishes what is queued and stops.
    pub fn close(&self) {
        self.lock().closed = true;
        self.shared.available.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of jobs waiting to be started.
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return every job still waiting.
    pub fn drain(&self) -> Vec<Job> {
        self.lock().jobs.drain(..).collect()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
