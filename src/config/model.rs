// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::classify::{DEFAULT_ALREADY_DONE, DEFAULT_PROGRESS_PREFIXES};
use crate::watch::RuleSet;

/// Token replaced with the observed text in rule arguments.
pub const DEFAULT_PLACEHOLDER: &str = "{clipboard}";

/// Lower bound for `poll_interval_ms`; polling faster only burns CPU.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

/// Configuration exactly as read from the TOML file.
///
/// ```toml
/// [config]
/// poll_interval_ms = 400
/// pause_after_run = false
///
/// [source]
/// kind = "command"
/// cmd = ["xclip", "-o", "-selection", "clipboard"]
///
/// [[rule]]
/// name = "video"
/// pattern = "^https://www\\.youtube\\.com/watch"
/// command = "yt-dlp"
/// args = ["--newline", "{clipboard}"]
/// ```
///
/// All sections except `[[rule]]` are optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub classify: ClassifySection,

    /// `[[rule]]` entries, in file order. Order matters: when several rules
    /// match the same text their jobs are queued in this order.
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// How often a polled source is read, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait for a key press after every job (rules can override).
    #[serde(default)]
    pub pause_after_run: bool,

    /// Keep a permanent status-board slot per job.
    #[serde(default)]
    pub status_board: bool,

    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_poll_interval_ms() -> u64 {
    400
}

fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            pause_after_run: false,
            status_board: false,
            placeholder: default_placeholder(),
        }
    }
}

/// `[source]` section: where the shared text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Poll the stdout of a command (`xclip -o`, `wl-paste`, `pbpaste`, ...).
    Command {
        #[serde(default = "default_clipboard_command")]
        cmd: Vec<String>,
    },
    /// Re-read a file whenever it changes.
    File { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Command {
            cmd: default_clipboard_command(),
        }
    }
}

fn default_clipboard_command() -> Vec<String> {
    let cmd: &[&str] = if cfg!(target_os = "macos") {
        &["pbpaste"]
    } else if cfg!(windows) {
        &["powershell", "-NoProfile", "-Command", "Get-Clipboard"]
    } else {
        &["xclip", "-o", "-selection", "clipboard"]
    };
    cmd.iter().map(|s| s.to_string()).collect()
}

/// `[classify]` section: output line heuristics.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifySection {
    /// Case-insensitive phrases meaning "nothing to do, already there".
    #[serde(default = "default_already_done")]
    pub already_done: Vec<String>,

    /// Line prefixes that mark transient progress output.
    #[serde(default = "default_progress_prefixes")]
    pub progress_prefixes: Vec<String>,
}

fn default_already_done() -> Vec<String> {
    DEFAULT_ALREADY_DONE.iter().map(|s| s.to_string()).collect()
}

fn default_progress_prefixes() -> Vec<String> {
    DEFAULT_PROGRESS_PREFIXES.iter().map(|s| s.to_string()).collect()
}

impl Default for ClassifySection {
    fn default() -> Self {
        Self {
            already_done: default_already_done(),
            progress_prefixes: default_progress_prefixes(),
        }
    }
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Friendly name for logs; the pattern is shown when absent.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Regular expression the observed text must match.
    pub pattern: String,

    #[serde(default = "default_true")]
    pub ignore_case: bool,

    /// Program to run.
    pub command: String,

    /// Arguments, one token each. The placeholder is substituted.
    #[serde(default)]
    pub args: Vec<String>,

    /// Legacy single raw argument string, used only when `args` is empty.
    #[serde(default)]
    pub parameter: Option<String>,

    #[serde(default)]
    pub working_directory: Option<String>,

    /// Overrides `[config].pause_after_run` for this rule.
    #[serde(default)]
    pub pause_after_run: Option<bool>,
}

fn default_true() -> bool {
    true
}

impl RuleConfig {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.pattern,
        }
    }

    pub fn effective_pause_after_run(&self, global: bool) -> bool {
        self.pause_after_run.unwrap_or(global)
    }
}

/// Validated configuration with compiled rules.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub source: SourceConfig,
    pub classify: ClassifySection,
    pub rules: RuleSet,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        source: SourceConfig,
        classify: ClassifySection,
        rules: RuleSet,
    ) -> Self {
        Self {
            config,
            source,
            classify,
            rules,
        }
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.config.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}
