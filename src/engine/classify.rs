// src/engine/classify.rs

//! Classification of command output lines.
//!
//! Download tools print a lot of redraw-style progress and, when there is
//! nothing to do, a handful of "already there" messages. The worker uses a
//! [`LinePolicy`] to decide how each line is shown. The default
//! [`HeuristicPolicy`] is driven by the `[classify]` config section and can
//! be swapped out entirely.

/// How a single output line should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// The tool reports the work was already done; shown as one terse status.
    AlreadyDone,
    /// Transient progress; drawn on the in-place progress line.
    Progress,
    /// Everything else; printed as a normal log line.
    Plain,
}

pub trait LinePolicy: Send + Sync {
    fn classify(&self, line: &str) -> LineClass;
}

pub const DEFAULT_ALREADY_DONE: &[&str] = &[
    "already downloaded",
    "already exist",
    "already been downloaded",
    "exists, skipping",
    "file is already present",
    "already present",
];

pub const DEFAULT_PROGRESS_PREFIXES: &[&str] = &[
    "[download]",
    "[Merger]",
    "[ExtractAudio]",
    "[Fixup",
    "[gallery-dl]",
];

/// Substring / prefix based classification.
///
/// - a line containing any `already_done` phrase (case-insensitive) is
///   [`LineClass::AlreadyDone`];
/// - a line starting with any `progress_prefixes` entry (case-sensitive) is
///   [`LineClass::Progress`];
/// - anything else is [`LineClass::Plain`].
///
/// The phrases are tool specific and can match unrelated output; that is
/// why they are configuration and not code.
#[derive(Debug, Clone)]
pub struct HeuristicPolicy {
    already_done: Vec<String>,
    progress_prefixes: Vec<String>,
}

impl HeuristicPolicy {
    pub fn new<A, P>(already_done: A, progress_prefixes: P) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            already_done: already_done
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            progress_prefixes: progress_prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }
}

impl Default for HeuristicPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALREADY_DONE.iter().copied(),
            DEFAULT_PROGRESS_PREFIXES.iter().copied(),
        )
    }
}

impl LinePolicy for HeuristicPolicy {
    fn classify(&self, line: &str) -> LineClass {
        let lower = line.to_lowercase();
        if self.already_done.iter().any(|p| lower.contains(p.as_str())) {
            return LineClass::AlreadyDone;
        }
        if self
            .progress_prefixes
            .iter()
            .any(|p| line.starts_with(p.as_str()))
        {
            return LineClass::Progress;
        }
        LineClass::Plain
    }
}

/// Treats every line as plain output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainPolicy;

impl LinePolicy for PlainPolicy {
    fn classify(&self, _line: &str) -> LineClass {
        LineClass::Plain
    }
}
