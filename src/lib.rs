// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, SourceConfig};
use crate::config::{default_config_path, load_and_validate};
use crate::console::Console;
use crate::engine::{
    Acknowledge, AutoAcknowledge, Dispatcher, EngineContext, HeuristicPolicy, JobQueue,
    KeyPressAcknowledger, SourceEvent, Worker, WorkerReport,
};
use crate::exec::ProcessRunner;

/// Heading of the status board, when `[config].status_board` is on.
pub const STATUS_BOARD_HEADING: &str = "Active jobs";

/// How long shutdown waits for the worker to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - job queue, worker and dispatcher
/// - process runner
/// - source monitor (skipped with `--text`)
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {:?}", config_path))?;
    info!(
        path = %config_path.display(),
        rules = cfg.rules.len(),
        enabled = cfg.rules.enabled_count(),
        "config loaded"
    );

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let ctx = EngineContext::new(Console::stdout());
    let cancel = CancellationToken::new();

    // Ctrl-C → graceful shutdown.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; shutting down");
            cancel.cancel();
        });
    }

    let queue = JobQueue::new();
    let dispatcher = Dispatcher::new(ctx.clone(), Arc::new(cfg.rules.clone()), queue.clone());

    match args.text {
        Some(text) => run_once(&cfg, ctx, queue, dispatcher, cancel, &text).await,
        None => run_watching(&cfg, ctx, queue, dispatcher, cancel).await,
    }
}

/// `--text`: dispatch one text, let the worker drain the queue, exit.
///
/// Fails if any job did not succeed, so scripts can check the exit status.
async fn run_once(
    cfg: &ConfigFile,
    ctx: EngineContext,
    queue: JobQueue,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
    text: &str,
) -> Result<()> {
    let ids = dispatcher.dispatch_text(text);
    if ids.is_empty() {
        ctx.console().line("[Queue] No rule matched.");
    }
    queue.close();

    let report = build_worker(cfg, ctx, queue, cancel)
        .spawn()
        .await
        .context("worker task failed")?;

    if report.unsuccessful > 0 {
        bail!(
            "{} of {} job(s) did not succeed",
            report.unsuccessful,
            report.started
        );
    }
    Ok(())
}

/// Normal mode: watch the source until Ctrl-C.
async fn run_watching(
    cfg: &ConfigFile,
    ctx: EngineContext,
    queue: JobQueue,
    dispatcher: Dispatcher,
    cancel: CancellationToken,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<SourceEvent>(64);
    let monitor = watch::spawn_monitor(&cfg.source, cfg.poll_interval(), tx, cancel.clone())?;

    let worker = build_worker(cfg, ctx.clone(), queue, cancel.clone())
        .without_history()
        .spawn();
    let dispatch = tokio::spawn(dispatcher.run(rx, cancel.clone()));

    ctx.console().line(&format!(
        "Watching {} with {} enabled rule(s). Press Ctrl+C to exit.",
        describe_source(&cfg.source),
        cfg.rules.enabled_count()
    ));

    cancel.cancelled().await;

    match tokio::time::timeout(SHUTDOWN_GRACE, worker).await {
        Ok(Ok(report)) => log_report(&report),
        Ok(Err(e)) => warn!(error = %e, "worker task failed"),
        Err(_) => warn!(grace = ?SHUTDOWN_GRACE, "worker did not stop in time"),
    }

    if tokio::time::timeout(SHUTDOWN_GRACE, monitor.join()).await.is_err() {
        warn!("source monitor did not stop in time");
    }
    if let Err(e) = dispatch.await {
        warn!(error = %e, "dispatcher task failed");
    }

    info!("shutdown complete");
    Ok(())
}

fn build_worker(
    cfg: &ConfigFile,
    ctx: EngineContext,
    queue: JobQueue,
    cancel: CancellationToken,
) -> Worker {
    let policy = HeuristicPolicy::new(
        cfg.classify.already_done.iter(),
        cfg.classify.progress_prefixes.iter(),
    );

    // Without a terminal there is nobody to press a key.
    let ack: Arc<dyn Acknowledge> = if std::io::stdin().is_terminal() {
        Arc::new(KeyPressAcknowledger::new(cancel.clone()))
    } else {
        debug!("stdin is not a terminal; pauses are acknowledged automatically");
        Arc::new(AutoAcknowledge)
    };

    let worker = Worker::new(ctx, queue, Arc::new(ProcessRunner::new()), cancel)
        .with_policy(Arc::new(policy))
        .with_acknowledger(ack);

    if cfg.config.status_board {
        worker.with_status_board(STATUS_BOARD_HEADING)
    } else {
        worker
    }
}

fn log_report(report: &WorkerReport) {
    info!(
        started = report.started,
        unsuccessful = report.unsuccessful,
        discarded = report.discarded.len(),
        "worker report"
    );
}

fn describe_source(source: &SourceConfig) -> String {
    match source {
        SourceConfig::Command { cmd } => match cmd.split_first() {
            Some((program, args)) => format!("command `{}`", exec::command_line(program, args)),
            None => "command".to_string(),
        },
        SourceConfig::File { path } => format!("file {}", path.display()),
    }
}

/// Simple dry-run output: print the source and every rule.
fn print_dry_run(cfg: &ConfigFile) {
    println!("cliptrigger dry-run");
    println!("  source = {}", describe_source(&cfg.source));
    println!("  config.poll_interval = {:?}", cfg.poll_interval());
    println!("  config.pause_after_run = {}", cfg.config.pause_after_run);
    println!("  config.status_board = {}", cfg.config.status_board);
    println!("  config.placeholder = {}", cfg.rules.placeholder());
    println!();

    println!("rules ({}):", cfg.rules.len());
    for rule in cfg.rules.iter() {
        println!("  - {}", rule.display_name());
        if !rule.is_enabled() {
            println!("      enabled: false");
        }
        println!("      pattern: {}", rule.pattern());
        println!(
            "      cmd: {}",
            exec::command_line(rule.command(), &exec::effective_args(rule.args()))
        );
        if let Some(dir) = rule.working_directory() {
            println!("      working_directory: {dir}");
        }
        if rule.pause_after_run() {
            println!("      pause_after_run: true");
        }
    }

    debug!("dry-run complete (no execution)");
}
