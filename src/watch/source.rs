// src/watch/source.rs

//! Readers for the shared text buffer.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

/// Something holding the current shared text.
///
/// `read_text` is blocking and may fail transiently (clipboard owned by
/// another process, file being rewritten); monitors just try again later.
pub trait TextSource: Send + Sync {
    /// Current text, or `None` when there is nothing to read.
    fn read_text(&self) -> Result<Option<String>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Reads the text from a command's stdout (`xclip -o`, `wl-paste`, `pbpaste`, ...).
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: String,
    args: Vec<String>,
}

impl CommandSource {
    /// `cmd[0]` is the program, the rest are its arguments.
    pub fn new(cmd: &[String]) -> Result<Self> {
        let Some((program, args)) = cmd.split_first() else {
            bail!("source command is empty");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl TextSource for CommandSource {
    fn read_text(&self) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("running source command '{}'", self.program))?;

        if !output.status.success() {
            // e.g. xclip exits non-zero while the clipboard is empty.
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        Ok(Some(text))
    }

    fn describe(&self) -> String {
        crate::exec::command_line(&self.program, &self.args)
    }
}

/// Reads the whole content of a file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TextSource for FileSource {
    fn read_text(&self) -> Result<Option<String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {:?}", self.path)),
        }
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
