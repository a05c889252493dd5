// src/console/board.rs

//! Multi-slot status board.
//!
//! Each slot is bound to the absolute screen row it was given when created
//! and keeps that row forever. Slots are never cleared or compacted: a
//! finished item keeps its last line on screen as a one-line history entry.
//!
//! Cursor repositioning can fail (terminal resized mid-draw, target row now
//! off-screen, no tty at all). Such failures are ignored; the next update
//! simply tries again.

use super::{Console, ConsoleState, fit_to_width, ignore};

const INITIAL_SLOT_TEXT: &str = "starting…";

/// Identifier of a slot on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(usize);

#[derive(Debug)]
struct Slot {
    title: String,
    text: String,
    /// `None` when the cursor position could not be determined at creation.
    row: Option<u16>,
}

/// Board bookkeeping, stored inside the console state so it shares the
/// console lock.
#[derive(Debug, Default)]
pub(crate) struct BoardState {
    /// First row of the board body, right under the heading.
    top: Option<u16>,
    slots: Vec<Slot>,
}

/// Handle for drawing on the board.
#[derive(Debug, Clone)]
pub struct StatusBoard {
    console: Console,
    heading: String,
}

impl StatusBoard {
    pub(crate) fn new(console: Console, heading: String) -> Self {
        Self { console, heading }
    }

    /// Create a new slot below all existing ones and draw its initial line.
    pub fn add(&self, title: impl Into<String>) -> SlotId {
        let mut state = self.console.lock();
        state.end_progress();

        if state.board.top.is_none() {
            ignore(state.term.write_out("\n"));
            let heading = format!("=== {} ===\n", self.heading);
            ignore(state.term.write_out(&heading));
            ignore(state.term.flush());
            state.board.top = state.term.cursor_position().ok().map(|(_, row)| row);
        }

        let index = state.board.slots.len();
        let target_row = state.board.top.map(|top| top.saturating_add(index as u16));

        // Make sure the screen extends down to the new slot's row.
        if let Some(target) = target_row {
            if let Ok((_, current)) = state.term.cursor_position() {
                for _ in current..=target {
                    ignore(state.term.write_out("\n"));
                }
            }
        }

        state.board.slots.push(Slot {
            title: title.into(),
            text: INITIAL_SLOT_TEXT.to_string(),
            row: target_row,
        });

        redraw(&mut state, index);
        SlotId(index)
    }

    /// Replace the slot's text and redraw its row in place.
    pub fn update(&self, slot: SlotId, text: impl Into<String>) {
        let mut state = self.console.lock();
        let Some(entry) = state.board.slots.get_mut(slot.0) else {
            return;
        };
        entry.text = text.into();
        redraw(&mut state, slot.0);
    }

    /// Final update for a slot. The row stays on screen.
    pub fn complete(&self, slot: SlotId, text: impl Into<String>) {
        self.update(slot, text);
    }

    /// Slots are kept as history; removing one does nothing.
    pub fn remove(&self, _slot: SlotId) {}

    pub fn len(&self) -> usize {
        self.console.lock().board.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last text written to `slot`.
    pub fn text(&self, slot: SlotId) -> Option<String> {
        let state = self.console.lock();
        state.board.slots.get(slot.0).map(|s| s.text.clone())
    }

    /// Screen row `slot` is bound to.
    pub fn row(&self, slot: SlotId) -> Option<u16> {
        let state = self.console.lock();
        state.board.slots.get(slot.0).and_then(|s| s.row)
    }
}

fn redraw(state: &mut ConsoleState, index: usize) {
    let Some(row) = state.board.slots[index].row else {
        return;
    };
    let Ok((saved_col, saved_row)) = state.term.cursor_position() else {
        return;
    };

    let slot = &state.board.slots[index];
    let line = fit_to_width(&format!("{} — {}", slot.title, slot.text), state.line_width());

    let (columns, rows) = state.term.size();
    let max_col = columns.saturating_sub(1);
    let max_row = rows.saturating_sub(1);

    if state.term.move_to(0, row.min(max_row)).is_err() {
        return;
    }
    ignore(state.term.write_out(&line));
    ignore(state.term.move_to(saved_col.min(max_col), saved_row.min(max_row)));
    ignore(state.term.flush());
}
