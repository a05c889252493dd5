#![allow(dead_code)]

use cliptrigger::config::{
    ClassifySection, ConfigFile, ConfigSection, RawConfigFile, RuleConfig, SourceConfig,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                source: SourceConfig::default(),
                classify: ClassifySection::default(),
                rule: Vec::new(),
            },
        }
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.config.rule.push(rule);
        self
    }

    pub fn with_pause_after_run(mut self, val: bool) -> Self {
        self.config.config.pause_after_run = val;
        self
    }

    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        self.config.config.placeholder = placeholder.to_string();
        self
    }

    pub fn with_source(mut self, source: SourceConfig) -> Self {
        self.config.source = source;
        self
    }

    /// The raw, unvalidated config.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleConfig`.
pub struct RuleConfigBuilder {
    rule: RuleConfig,
}

impl RuleConfigBuilder {
    pub fn new(pattern: &str, command: &str) -> Self {
        Self {
            rule: RuleConfig {
                name: None,
                enabled: true,
                pattern: pattern.to_string(),
                ignore_case: true,
                command: command.to_string(),
                args: Vec::new(),
                parameter: None,
                working_directory: None,
                pause_after_run: None,
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.rule.name = Some(name.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.rule.args.push(arg.to_string());
        self
    }

    pub fn parameter(mut self, raw: &str) -> Self {
        self.rule.parameter = Some(raw.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.rule.enabled = false;
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.rule.ignore_case = false;
        self
    }

    pub fn working_directory(mut self, dir: &str) -> Self {
        self.rule.working_directory = Some(dir.to_string());
        self
    }

    pub fn pause_after_run(mut self, val: bool) -> Self {
        self.rule.pause_after_run = Some(val);
        self
    }

    pub fn build(self) -> RuleConfig {
        self.rule
    }
}
