// tests/status_board.rs

use cliptrigger::console::{Console, MemoryTerminal, display_width, fit_to_width};

fn setup(width: u16, height: u16) -> (MemoryTerminal, Console) {
    let term = MemoryTerminal::new(width, height);
    let console = Console::new(term.clone());
    (term, console)
}

#[test]
fn slots_keep_their_rows_and_are_never_cleared() {
    let (term, console) = setup(60, 40);
    console.line("log 1");

    let board = console.status_board("Active jobs");
    let a = board.add("#1 clip");
    let b = board.add("#2 song");

    assert_eq!(board.row(a), Some(3));
    assert_eq!(board.row(b), Some(4));

    board.update(a, "[download] 50%");
    board.complete(b, "done");
    board.remove(a);

    let lines = term.lines();
    assert_eq!(lines[0], "log 1");
    assert_eq!(lines[1], "");
    assert_eq!(lines[2], "=== Active jobs ===");
    assert_eq!(lines[3], "#1 clip — [download] 50%");
    assert_eq!(lines[4], "#2 song — done");

    assert_eq!(board.len(), 2);
    assert_eq!(board.text(a).as_deref(), Some("[download] 50%"));
}

#[test]
fn heading_is_printed_once() {
    let (term, console) = setup(60, 40);
    let board = console.status_board("Active jobs");
    board.add("one");
    board.add("two");
    board.add("three");

    let headings = term
        .lines()
        .iter()
        .filter(|l| l.starts_with("=== "))
        .count();
    assert_eq!(headings, 1);
}

#[test]
fn new_slot_starts_with_placeholder_text() {
    let (term, console) = setup(60, 40);
    let board = console.status_board("Active jobs");
    let slot = board.add("#7 video");

    assert_eq!(board.text(slot).as_deref(), Some("starting…"));
    assert!(term.lines().contains(&"#7 video — starting…".to_string()));
}

#[test]
fn redraw_restores_the_cursor() {
    let (term, console) = setup(60, 40);
    let board = console.status_board("Active jobs");
    let slot = board.add("#1");
    console.line("after the board");
    let before = term.cursor();

    board.update(slot, "halfway");

    assert_eq!(term.cursor(), before);
    console.line("next log");
    assert!(term.lines().contains(&"next log".to_string()));
}

#[test]
fn long_status_is_truncated_to_the_terminal_width() {
    let (term, console) = setup(20, 40);
    let board = console.status_board("B");
    let slot = board.add("title");
    board.update(slot, "a very long status text that does not fit");

    let row = board.row(slot).unwrap() as usize;
    let raw = term.raw_row(row).unwrap();
    assert_eq!(raw.chars().count(), 19);
    assert!(raw.ends_with('…'));
}

#[test]
fn wide_titles_are_fitted_by_display_columns() {
    let (term, console) = setup(20, 40);
    let board = console.status_board("B");
    let slot = board.add("日本語のビデオタイトル");

    let row = board.row(slot).unwrap() as usize;
    let raw = term.raw_row(row).unwrap();
    assert_eq!(display_width(&raw), 19);
    assert!(raw.trim_end().ends_with('…'));
}

#[test]
fn rows_outside_the_screen_do_not_break_output() {
    // Screen too short for the slot: positions get clamped, nothing fails.
    let (term, console) = setup(40, 3);
    for n in 0..5 {
        console.line(&format!("line {n}"));
    }
    let board = console.status_board("Active jobs");
    let slot = board.add("#1");
    board.update(slot, "still fine");

    assert_eq!(board.text(slot).as_deref(), Some("still fine"));
    console.line("logging still works");
    assert!(term.lines().contains(&"logging still works".to_string()));
}

#[test]
fn fit_to_width_pads_and_truncates() {
    assert_eq!(fit_to_width("ab", 4), "ab  ");
    assert_eq!(fit_to_width("abcdef", 4), "abc…");
}
