// src/console/mod.rs

//! Human-facing console output.
//!
//! Two rendering disciplines share the terminal:
//!
//! - an in-place **progress line** that is redrawn with `\r` and closed with
//!   a newline before any normal log line is printed, and
//! - a **status board** ([`board`]) whose slots are bound to fixed screen rows.
//!
//! Every write goes through the single mutex inside [`Console`], so output
//! from the worker, the dispatcher and the board never interleaves mid-line.

pub mod board;
pub mod terminal;

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::trace;
use unicode_width::UnicodeWidthChar;

pub use board::{SlotId, StatusBoard};
pub use terminal::{CrosstermTerminal, MemoryTerminal, Terminal};

use board::BoardState;

const ELLIPSIS: char = '…';

pub(crate) struct ConsoleState {
    pub(crate) term: Box<dyn Terminal>,
    progress_active: bool,
    pub(crate) board: BoardState,
}

impl ConsoleState {
    /// Usable line width: one column short of the terminal so writing a full
    /// line never wraps.
    pub(crate) fn line_width(&self) -> usize {
        let (columns, _) = self.term.size();
        usize::from(columns).saturating_sub(1).max(1)
    }

    pub(crate) fn end_progress(&mut self) {
        if self.progress_active {
            self.progress_active = false;
            ignore(self.term.write_out("\n"));
        }
    }
}

/// Cloneable handle to the shared console.
#[derive(Clone)]
pub struct Console {
    inner: Arc<Mutex<ConsoleState>>,
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console").finish_non_exhaustive()
    }
}

impl Console {
    pub fn new(term: impl Terminal + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ConsoleState {
                term: Box::new(term),
                progress_active: false,
                board: BoardState::default(),
            })),
        }
    }

    /// Console bound to the real stdout / stderr.
    ///
    /// There is one such console per process; every call returns a handle to
    /// it, so the job transcript and diagnostics share a single lock.
    pub fn stdout() -> Self {
        static STDOUT: OnceLock<Console> = OnceLock::new();
        STDOUT
            .get_or_init(|| Self::new(CrosstermTerminal::new()))
            .clone()
    }

    /// Print a normal, durable log line.
    pub fn line(&self, text: &str) {
        let mut state = self.lock();
        state.end_progress();
        ignore(state.term.write_out(text));
        ignore(state.term.write_out("\n"));
        ignore(state.term.flush());
    }

    /// Print a durable line on the error stream.
    pub fn error_line(&self, text: &str) {
        let mut state = self.lock();
        state.end_progress();
        ignore(state.term.flush());
        ignore(state.term.write_err(text));
        ignore(state.term.write_err("\n"));
    }

    /// Write already formatted diagnostic text (a `tracing` record) to the
    /// error stream, closing any progress line first.
    pub fn diagnostic(&self, text: &str) {
        let mut state = self.lock();
        state.end_progress();
        ignore(state.term.flush());
        ignore(state.term.write_err(text));
    }

    /// Print an empty line.
    pub fn blank(&self) {
        self.line("");
    }

    /// Redraw the in-place progress line.
    pub fn progress(&self, text: &str) {
        let mut state = self.lock();
        let width = state.line_width();
        let fitted = fit_to_width(text, width);
        state.progress_active = true;
        ignore(state.term.write_out("\r"));
        ignore(state.term.write_out(&fitted));
        ignore(state.term.flush());
    }

    /// Close the progress line (if one is being drawn) so later output starts
    /// on a fresh row.
    pub fn end_progress(&self) {
        let mut state = self.lock();
        state.end_progress();
        ignore(state.term.flush());
    }

    /// Handle to the status board drawn under `heading`.
    ///
    /// There is one board per console; the heading of the first slot ever
    /// created wins.
    pub fn status_board(&self, heading: impl Into<String>) -> StatusBoard {
        StatusBoard::new(self.clone(), heading.into())
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ConsoleState> {
        // A panic while holding the lock leaves at worst a half-written line.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Truncate `text` to `width` terminal columns (ending in `…`) or pad it
/// with spaces so it exactly covers whatever was drawn there before.
///
/// Wide characters (CJK, most emoji) count as two columns. When one does not
/// fit in front of the ellipsis, the gap is padded instead.
pub fn fit_to_width(text: &str, width: usize) -> String {
    let width = width.max(1);
    let columns = display_width(text);

    if columns <= width {
        let mut out = String::with_capacity(text.len() + (width - columns));
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', width - columns));
        return out;
    }

    let budget = width - 1;
    let mut used = 0;
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let w = char_width(ch);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push(ELLIPSIS);
    out.extend(std::iter::repeat_n(' ', budget - used));
    out
}

/// Number of terminal columns `text` occupies.
pub fn display_width(text: &str) -> usize {
    text.chars().map(char_width).sum()
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Console write failures (closed stdout, resized terminal, ...) are never
/// propagated; the next write tries again.
pub(crate) fn ignore(res: std::io::Result<()>) {
    if let Err(e) = res {
        trace!(error = %e, "console write failed");
    }
}
