use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cliptrigger::errors::RunError;
use cliptrigger::exec::{LineSink, RunFuture, RunOutput, RunRequest, RunnerBackend};
use tokio_util::sync::CancellationToken;

/// One step of a scripted command.
#[derive(Debug, Clone)]
enum Step {
    Stdout(String),
    Stderr(String),
    Sleep(Duration),
}

/// What a fake command does when "run".
#[derive(Debug, Clone, Default)]
pub struct Script {
    steps: Vec<Step>,
    exit_code: i32,
    launch_failure: bool,
    wait_for_cancel: bool,
    panic: bool,
}

impl Script {
    /// Exits with 0 and prints nothing.
    pub fn ok() -> Self {
        Self::default()
    }

    /// Cannot be started at all.
    pub fn launch_failure() -> Self {
        Self {
            launch_failure: true,
            ..Self::default()
        }
    }

    /// Runs until cancelled.
    pub fn hang() -> Self {
        Self {
            wait_for_cancel: true,
            ..Self::default()
        }
    }

    /// Panics after starting.
    pub fn panics() -> Self {
        Self {
            panic: true,
            ..Self::default()
        }
    }

    pub fn stdout(mut self, line: &str) -> Self {
        self.steps.push(Step::Stdout(line.to_string()));
        self
    }

    pub fn stderr(mut self, line: &str) -> Self {
        self.steps.push(Step::Stderr(line.to_string()));
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.steps.push(Step::Sleep(Duration::from_millis(ms)));
        self
    }

    pub fn exit(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }
}

/// A recorded start of a fake command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedRun {
    pub command: String,
    pub args: Vec<String>,
    pub working_directory: Option<String>,
}

#[derive(Debug, Default)]
struct RunLog {
    started: Vec<StartedRun>,
    running: usize,
    max_running: usize,
}

/// A scripted runner backend that:
/// - records every started command, in start order,
/// - tracks how many commands overlap,
/// - plays a [`Script`] chosen by command name (default: [`Script::ok`]).
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    log: Arc<Mutex<RunLog>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `script` whenever `command` is run.
    pub fn script(self, command: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(command.to_string(), script);
        self
    }

    pub fn started(&self) -> Vec<StartedRun> {
        self.log.lock().unwrap().started.clone()
    }

    /// First argument of each started command; handy when commands share a
    /// program name and differ by argument.
    pub fn started_first_args(&self) -> Vec<String> {
        self.started()
            .into_iter()
            .map(|r| r.args.first().cloned().unwrap_or_default())
            .collect()
    }

    pub fn max_concurrency(&self) -> usize {
        self.log.lock().unwrap().max_running
    }

    pub fn running(&self) -> usize {
        self.log.lock().unwrap().running
    }

    fn script_for(&self, command: &str) -> Script {
        self.scripts
            .lock()
            .unwrap()
            .get(command)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, request: &RunRequest<'_>) -> RunningGuard {
        let mut log = self.log.lock().unwrap();
        log.started.push(StartedRun {
            command: request.command.to_string(),
            args: request.args.to_vec(),
            working_directory: request.working_directory.map(str::to_string),
        });
        log.running += 1;
        log.max_running = log.max_running.max(log.running);
        RunningGuard {
            log: Arc::clone(&self.log),
        }
    }
}

/// Decrements the running count even if the script panics.
struct RunningGuard {
    log: Arc<Mutex<RunLog>>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.running -= 1;
        }
    }
}

impl RunnerBackend for FakeRunner {
    fn run<'a>(
        &'a self,
        request: RunRequest<'a>,
        cancel: &'a CancellationToken,
        on_stdout: LineSink<'a>,
        on_stderr: LineSink<'a>,
    ) -> RunFuture<'a> {
        Box::pin(async move {
            let script = self.script_for(request.command);

            if script.launch_failure {
                return Err(RunError::LaunchFailure {
                    command: request.command.to_string(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
                });
            }

            let _guard = self.enter(&request);

            if script.panic {
                panic!("scripted panic in '{}'", request.command);
            }

            let mut stdout = Vec::new();
            let mut stderr = Vec::new();

            for step in &script.steps {
                match step {
                    Step::Stdout(line) => {
                        on_stdout(line.as_str());
                        stdout.push(line.clone());
                    }
                    Step::Stderr(line) => {
                        on_stderr(line.as_str());
                        stderr.push(line.clone());
                    }
                    Step::Sleep(d) => {
                        tokio::select! {
                            _ = tokio::time::sleep(*d) => {}
                            _ = cancel.cancelled() => return Err(RunError::Cancelled),
                        }
                    }
                }
            }

            if script.wait_for_cancel {
                cancel.cancelled().await;
                return Err(RunError::Cancelled);
            }

            Ok(RunOutput {
                exit_code: script.exit_code,
                stdout: stdout.join("\n"),
                stderr: stderr.join("\n"),
            })
        })
    }
}
