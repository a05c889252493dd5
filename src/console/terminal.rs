// src/console/terminal.rs

//! Terminal abstraction used by the console renderer.
//!
//! [`CrosstermTerminal`] drives the real terminal through `crossterm`.
//! [`MemoryTerminal`] is a tiny virtual screen that interprets `\r`, `\n`
//! and cursor moves, so rendered output can be asserted on in tests.

use std::io::{self, Stderr, Stdout, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crossterm::{QueueableCommand, cursor, terminal};

const FALLBACK_WIDTH: u16 = 80;
const FALLBACK_HEIGHT: u16 = 24;

/// Minimal set of terminal operations the renderer needs.
pub trait Terminal: Send {
    /// Write to the normal output stream (no implicit newline).
    fn write_out(&mut self, text: &str) -> io::Result<()>;

    /// Write to the error stream (no implicit newline).
    fn write_err(&mut self, text: &str) -> io::Result<()>;

    /// Terminal size as `(columns, rows)`.
    fn size(&self) -> (u16, u16);

    /// Current cursor position as `(column, row)`, zero based.
    fn cursor_position(&mut self) -> io::Result<(u16, u16)>;

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// The process' real stdout / stderr.
pub struct CrosstermTerminal {
    out: Stdout,
    err: Stderr,
}

impl CrosstermTerminal {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            err: io::stderr(),
        }
    }
}

impl Default for CrosstermTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CrosstermTerminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrosstermTerminal").finish()
    }
}

impl Terminal for CrosstermTerminal {
    fn write_out(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    fn write_err(&mut self, text: &str) -> io::Result<()> {
        self.err.write_all(text.as_bytes())?;
        self.err.flush()
    }

    fn size(&self) -> (u16, u16) {
        terminal::size().unwrap_or((FALLBACK_WIDTH, FALLBACK_HEIGHT))
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        // The position query goes through the terminal itself, so anything
        // still buffered must be out first.
        self.out.flush()?;
        cursor::position()
    }

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        self.out.queue(cursor::MoveTo(column, row))?;
        self.out.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[derive(Debug, Default)]
struct Screen {
    rows: Vec<Vec<char>>,
    column: u16,
    row: u16,
    errors: String,
}

/// In-memory terminal. Cloning shares the same screen.
#[derive(Debug, Clone)]
pub struct MemoryTerminal {
    screen: Arc<Mutex<Screen>>,
    width: u16,
    height: u16,
}

impl MemoryTerminal {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen::default())),
            width,
            height,
        }
    }

    /// All screen rows with trailing spaces removed.
    pub fn lines(&self) -> Vec<String> {
        let screen = self.lock();
        screen
            .rows
            .iter()
            .map(|r| r.iter().collect::<String>().trim_end().to_string())
            .collect()
    }

    /// Raw content of one row, including padding.
    pub fn raw_row(&self, row: usize) -> Option<String> {
        self.lock().rows.get(row).map(|r| r.iter().collect())
    }

    /// Everything written to the error stream.
    pub fn errors(&self) -> String {
        self.lock().errors.clone()
    }

    pub fn cursor(&self) -> (u16, u16) {
        let screen = self.lock();
        (screen.column, screen.row)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Screen {
    fn put(&mut self, ch: char) {
        let row = self.row as usize;
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let line = &mut self.rows[row];
        let col = self.column as usize;
        if line.len() <= col {
            line.resize(col + 1, ' ');
        }
        line[col] = ch;
        self.column = self.column.saturating_add(1);
    }

    fn newline(&mut self) {
        self.row = self.row.saturating_add(1);
        self.column = 0;
        let row = self.row as usize;
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
    }
}

impl Terminal for MemoryTerminal {
    fn write_out(&mut self, text: &str) -> io::Result<()> {
        let mut screen = self.lock();
        for ch in text.chars() {
            match ch {
                '\r' => screen.column = 0,
                '\n' => screen.newline(),
                other => screen.put(other),
            }
        }
        Ok(())
    }

    fn write_err(&mut self, text: &str) -> io::Result<()> {
        self.lock().errors.push_str(text);
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn cursor_position(&mut self) -> io::Result<(u16, u16)> {
        Ok(self.cursor())
    }

    fn move_to(&mut self, column: u16, row: u16) -> io::Result<()> {
        if column >= self.width || row >= self.height {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cursor target ({column}, {row}) outside {}x{}", self.width, self.height),
            ));
        }
        let mut screen = self.lock();
        screen.column = column;
        screen.row = row;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
