// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`lines`] turns raw output bytes into line events (`\n` and `\r` both
//!   terminate a line).
//! - [`runner`] starts one command with `tokio::process::Command`, streams
//!   both output pipes and supports cancellation of the whole process tree.
//! - [`backend`] provides the `RunnerBackend` trait the worker runs jobs
//!   through, implemented by [`ProcessRunner`] in production and by fakes in
//!   tests.

pub mod backend;
pub mod lines;
pub mod runner;

pub use backend::{RunFuture, RunnerBackend};
pub use lines::{LineSplitter, split_all, split_lines};
pub use runner::{LineSink, ProcessRunner, RunOutput, RunRequest, command_line, effective_args};
