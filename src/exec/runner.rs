// src/exec/runner.rs

//! Single process execution with live line streaming.

use std::pin::pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::RunError;
use crate::exec::lines::split_lines;

/// How long the readers may keep draining after the process group is killed.
const CANCEL_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Everything needed to start one process.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest<'a> {
    pub command: &'a str,
    pub args: &'a [String],
    /// Ignored when `None` or blank.
    pub working_directory: Option<&'a str>,
}

/// Result of a process that ran to completion (successfully or not).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    /// All stdout lines joined with `\n`.
    pub stdout: String,
    /// All stderr lines joined with `\n`.
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Per-line callback. Called synchronously from the stream reader.
pub type LineSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Runs commands with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Start `request`, stream both output streams line by line and wait for
    /// the process to exit.
    ///
    /// If `cancel` fires before both streams are closed and the process has
    /// exited, the process group is killed, the readers are drained and
    /// `RunError::Cancelled` is returned. This holds even when the direct
    /// child already exited and a descendant still holds the pipes open.
    pub async fn run(
        &self,
        request: RunRequest<'_>,
        cancel: &CancellationToken,
        on_stdout: LineSink<'_>,
        on_stderr: LineSink<'_>,
    ) -> Result<RunOutput, RunError> {
        let mut cmd = build_command(&request);

        let mut child = cmd.spawn().map_err(|source| RunError::LaunchFailure {
            command: request.command.to_string(),
            source,
        })?;

        info!(
            command = %request.command,
            pid = child.id().unwrap_or_default(),
            "process started"
        );

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let mut out_lines: Vec<String> = Vec::new();
        let mut err_lines: Vec<String> = Vec::new();

        let read_stdout = async {
            match stdout {
                Some(pipe) => {
                    split_lines(pipe, |line| {
                        on_stdout(&line);
                        out_lines.push(line);
                    })
                    .await
                }
                None => Ok(()),
            }
        };

        let read_stderr = async {
            match stderr {
                Some(pipe) => {
                    split_lines(pipe, |line| {
                        on_stderr(&line);
                        err_lines.push(line);
                    })
                    .await
                }
                None => Ok(()),
            }
        };

        // The group id outlives the leader: a backgrounded helper can keep the
        // pipes open after the direct child has exited.
        let pgid = child.id();

        let wait = async {
            tokio::select! {
                status = child.wait() => status.map(Some),
                _ = cancel.cancelled() => {
                    kill_child(&mut child);
                    // Reap the child; the exit status of a killed process is irrelevant.
                    if let Err(e) = child.wait().await {
                        debug!(error = %e, "waiting for killed process failed");
                    }
                    Ok(None)
                }
            }
        };

        let (out_res, err_res, wait_res) = {
            let mut work = pin!(async { tokio::join!(read_stdout, read_stderr, wait) });

            tokio::select! {
                joined = &mut work => joined,
                _ = cancel.cancelled() => {
                    info!(command = %request.command, "cancellation requested; killing process tree");
                    kill_process_group(pgid);
                    if tokio::time::timeout(CANCEL_DRAIN_TIMEOUT, &mut work).await.is_err() {
                        warn!(command = %request.command, "output still open after kill; abandoning readers");
                    }
                    return Err(RunError::Cancelled);
                }
            }
        };

        let io_err = |source| RunError::Io {
            command: request.command.to_string(),
            source,
        };

        let status = wait_res.map_err(io_err)?;
        let Some(status) = status else {
            return Err(RunError::Cancelled);
        };
        out_res.map_err(io_err)?;
        err_res.map_err(io_err)?;

        let exit_code = status.code().unwrap_or(-1);
        debug!(
            command = %request.command,
            exit_code,
            stdout_lines = out_lines.len(),
            stderr_lines = err_lines.len(),
            "process exited"
        );

        Ok(RunOutput {
            exit_code,
            stdout: out_lines.join("\n"),
            stderr: err_lines.join("\n"),
        })
    }
}

fn build_command(request: &RunRequest<'_>) -> Command {
    let mut cmd = Command::new(request.command);
    cmd.args(effective_args(request.args));

    if let Some(dir) = request.working_directory {
        if !dir.trim().is_empty() {
            cmd.current_dir(dir);
        }
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    // Own process group, so cancellation can take down grandchildren too.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd
}

/// Resolve the argument list actually handed to the OS.
///
/// A single argument containing whitespace and no `"` is a legacy raw
/// parameter string and is split shell-style. Anything else is passed
/// through token by token.
pub fn effective_args(args: &[String]) -> Vec<String> {
    match args {
        [raw] if raw.chars().any(char::is_whitespace) && !raw.contains('"') => {
            shell_words::split(raw).unwrap_or_else(|e| {
                debug!(raw = %raw, error = %e, "raw parameter not shell-parsable; splitting on whitespace");
                raw.split_whitespace().map(str::to_string).collect()
            })
        }
        _ => args.to_vec(),
    }
}

/// Human readable command line, quoting arguments where needed.
pub fn command_line(command: &str, args: &[String]) -> String {
    if args.is_empty() {
        return command.to_string();
    }
    format!("{} {}", command, shell_words::join(args))
}

/// Forcefully terminate every process in the group led by `pgid`.
fn kill_process_group(pgid: Option<u32>) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        if let Some(pid) = pgid {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                debug!(pid, error = %e, "killpg failed");
            }
        }
    }

    #[cfg(not(unix))]
    let _ = pgid;
}

/// Kill the direct child, plus its group where process groups exist.
fn kill_child(child: &mut Child) {
    kill_process_group(child.id());
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "kill failed (process probably already gone)");
    }
}
