// src/exec/lines.rs

//! Carriage-return aware line splitting.
//!
//! Progress-drawing tools (download managers, encoders, ...) redraw a single
//! line with `\r` and rarely emit `\n`. `BufRead::lines` would hold those
//! updates back until the very end, so both `\n` and `\r` are treated as
//! line boundaries here and runs of boundaries never yield empty lines.

use tokio::io::{AsyncRead, AsyncReadExt};

const READ_CHUNK: usize = 8 * 1024;

/// Incremental byte-fed splitter.
///
/// Feed it arbitrary chunks with [`LineSplitter::feed`] and call
/// [`LineSplitter::finish`] at end of stream to flush a trailing partial line.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume `bytes`, calling `on_line` once per completed line.
    pub fn feed(&mut self, bytes: &[u8], mut on_line: impl FnMut(String)) {
        for &b in bytes {
            if b == b'\n' || b == b'\r' {
                // `\r` and `\n` never occur inside a multi-byte UTF-8
                // sequence, so cutting here cannot split a character.
                if !self.pending.is_empty() {
                    on_line(self.take_line());
                }
            } else {
                self.pending.push(b);
            }
        }
    }

    /// Flush whatever is buffered as a final line (if anything).
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.take_line())
        }
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        line
    }
}

/// Convenience: split a complete buffer into lines.
pub fn split_all(bytes: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut splitter = LineSplitter::new();
    splitter.feed(bytes, |line| lines.push(line));
    lines.extend(splitter.finish());
    lines
}

/// Read `reader` to the end, invoking `on_line` for every completed line as
/// soon as its terminator arrives.
pub async fn split_lines<R>(mut reader: R, mut on_line: impl FnMut(String)) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut splitter = LineSplitter::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        splitter.feed(&buf[..n], &mut on_line);
    }

    if let Some(last) = splitter.finish() {
        on_line(last);
    }
    Ok(())
}
