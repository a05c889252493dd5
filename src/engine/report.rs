// src/engine/report.rs

use crate::console::{Console, SlotId, StatusBoard};
use crate::engine::job::JobId;

/// Console output for one running job, prefixed with `[Job #id]`.
///
/// When a status board is attached, progress and the final status are also
/// mirrored into the job's board slot.
#[derive(Debug, Clone)]
pub struct JobReporter {
    console: Console,
    prefix: String,
    slot: Option<(StatusBoard, SlotId)>,
}

impl JobReporter {
    pub fn new(console: Console, id: JobId) -> Self {
        Self {
            console,
            prefix: format!("[Job {id}]"),
            slot: None,
        }
    }

    /// Track this job on `board` under `title`.
    pub fn with_board(mut self, board: &StatusBoard, title: &str) -> Self {
        let slot = board.add(title);
        self.slot = Some((board.clone(), slot));
        self
    }

    pub fn log(&self, message: &str) {
        self.console.line(&format!("{} {}", self.prefix, message));
    }

    pub fn log_err(&self, message: &str) {
        self.console.error_line(&format!("{} {}", self.prefix, message));
    }

    pub fn progress(&self, line: &str) {
        self.console.progress(&format!("{} {}", self.prefix, line));
        self.status(line);
    }

    pub fn end_progress(&self) {
        self.console.end_progress();
    }

    /// Update the board slot only (no-op without a board).
    pub fn status(&self, text: &str) {
        if let Some((board, slot)) = &self.slot {
            board.update(*slot, text);
        }
    }

    /// Final board status for this job; the slot stays on screen.
    pub fn finish(&self, text: &str) {
        if let Some((board, slot)) = &self.slot {
            board.complete(*slot, text);
        }
    }
}
