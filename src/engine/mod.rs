// src/engine/mod.rs

//! Job queue engine.
//!
//! This module ties together:
//! - the [`Job`] type and its lifecycle,
//! - the FIFO [`JobQueue`] fed by the [`Dispatcher`],
//! - the single [`Worker`] that drains the queue one job at a time,
//! - line classification ([`classify`]) and pause acknowledgment
//!   ([`acknowledge`]).
//!
//! Shared output and id allocation live in [`EngineContext`].

pub mod acknowledge;
pub mod classify;
pub mod context;
pub mod dispatch;
pub mod job;
pub mod queue;
pub mod report;
pub mod worker;

pub use acknowledge::{Acknowledge, AutoAcknowledge, KeyPressAcknowledger};
pub use classify::{HeuristicPolicy, LineClass, LinePolicy, PlainPolicy};
pub use context::EngineContext;
pub use dispatch::Dispatcher;
pub use job::{Job, JobId, JobOutcome, JobSpec, JobState};
pub use queue::JobQueue;
pub use report::JobReporter;
pub use worker::{Worker, WorkerReport};

/// Events flowing from the source monitor into the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// New, non-empty text appeared in the watched buffer.
    TextObserved(String),
}
