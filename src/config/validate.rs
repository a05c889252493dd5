// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, SourceConfig};
use crate::errors::{CliptriggerError, Result};
use crate::watch::RuleSet;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = CliptriggerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let rules = RuleSet::compile(&raw.rule, &raw.config)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.source, raw.classify, rules))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_rules(cfg)?;
    validate_global_config(cfg)?;
    validate_source(cfg)?;
    validate_rules(cfg)?;
    Ok(())
}

fn ensure_has_rules(cfg: &RawConfigFile) -> Result<()> {
    if cfg.rule.is_empty() {
        return Err(CliptriggerError::ConfigError(
            "no rules defined; add at least one [[rule]] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // poll_interval_ms below the minimum is clamped, not rejected.
    if cfg.config.placeholder.trim().is_empty() {
        return Err(CliptriggerError::ConfigError(
            "[config].placeholder must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_source(cfg: &RawConfigFile) -> Result<()> {
    match &cfg.source {
        SourceConfig::Command { cmd } => {
            if cmd.first().is_none_or(|program| program.trim().is_empty()) {
                return Err(CliptriggerError::ConfigError(
                    "[source].cmd must name a program".to_string(),
                ));
            }
        }
        SourceConfig::File { path } => {
            if path.as_os_str().is_empty() {
                return Err(CliptriggerError::ConfigError(
                    "[source].path must not be empty".to_string(),
                ));
            }
        }
    }
    Ok(())
}

fn validate_rules(cfg: &RawConfigFile) -> Result<()> {
    for (index, rule) in cfg.rule.iter().enumerate() {
        if rule.pattern.trim().is_empty() {
            return Err(CliptriggerError::ConfigError(format!(
                "rule #{} has an empty `pattern`",
                index + 1
            )));
        }
        if rule.command.trim().is_empty() {
            return Err(CliptriggerError::ConfigError(format!(
                "rule '{}' has an empty `command`",
                rule.display_name()
            )));
        }
    }
    Ok(())
}
