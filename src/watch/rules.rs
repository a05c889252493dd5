// src/watch/rules.rs

use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::config::model::{ConfigSection, RuleConfig};
use crate::engine::job::JobSpec;
use crate::errors::{CliptriggerError, Result};

/// A single compiled `[[rule]]`.
#[derive(Clone)]
pub struct MatchRule {
    display_name: String,
    enabled: bool,
    pattern: Regex,
    command: String,
    args: Vec<String>,
    working_directory: Option<String>,
    pause_after_run: bool,
}

impl fmt::Debug for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchRule")
            .field("name", &self.display_name)
            .field("pattern", &self.pattern.as_str())
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl MatchRule {
    /// Compile `rule`, resolving defaults from `[config]`.
    pub fn compile(rule: &RuleConfig, defaults: &ConfigSection) -> Result<Self> {
        let pattern = RegexBuilder::new(&rule.pattern)
            .case_insensitive(rule.ignore_case)
            .build()
            .map_err(|source| CliptriggerError::InvalidPattern {
                rule: rule.display_name().to_string(),
                source,
            })?;

        // `parameter` is only a fallback for configs written before `args`.
        let args = if rule.args.is_empty() {
            rule.parameter
                .iter()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .collect()
        } else {
            rule.args.clone()
        };

        Ok(Self {
            display_name: rule.display_name().to_string(),
            enabled: rule.enabled,
            pattern,
            command: rule.command.clone(),
            args,
            working_directory: rule.working_directory.clone(),
            pause_after_run: rule.effective_pause_after_run(defaults.pause_after_run),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Argument template, placeholders not yet substituted.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_directory(&self) -> Option<&str> {
        self.working_directory.as_deref()
    }

    pub fn pause_after_run(&self) -> bool {
        self.pause_after_run
    }

    /// True if the rule is enabled and its pattern matches `text`.
    pub fn matches(&self, text: &str) -> bool {
        self.enabled && self.pattern.is_match(text)
    }

    /// Build the job spec for `text`, replacing every `placeholder`.
    pub fn job_spec(&self, text: &str, placeholder: &str) -> JobSpec {
        let args = self.args.iter().map(|a| a.replace(placeholder, text));
        let mut spec = JobSpec::new(&self.display_name, &self.command)
            .args(args)
            .pause_after_run(self.pause_after_run);
        if let Some(dir) = &self.working_directory {
            spec = spec.working_directory(dir);
        }
        spec
    }
}

/// All rules of a config, in file order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<MatchRule>,
    placeholder: String,
}

impl RuleSet {
    pub fn new(rules: Vec<MatchRule>, placeholder: impl Into<String>) -> Self {
        Self {
            rules,
            placeholder: placeholder.into(),
        }
    }

    pub fn compile(rules: &[RuleConfig], defaults: &ConfigSection) -> Result<Self> {
        let compiled = rules
            .iter()
            .map(|r| MatchRule::compile(r, defaults))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(compiled, defaults.placeholder.clone()))
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }

    /// One job spec per enabled rule matching `text`, in rule order.
    pub fn match_text(&self, text: &str) -> Vec<JobSpec> {
        self.rules
            .iter()
            .filter(|r| r.matches(text))
            .map(|r| r.job_spec(text, &self.placeholder))
            .collect()
    }
}
