// tests/config_loading.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, RuleConfigBuilder};

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use cliptrigger::config::{ConfigFile, SourceConfig, load_and_validate, parse_str};
use cliptrigger::errors::CliptriggerError;

type TestResult = Result<(), Box<dyn Error>>;

const FULL_CONFIG: &str = r#"
[config]
poll_interval_ms = 250
pause_after_run = true
status_board = true

[source]
kind = "file"
path = "/tmp/shared.txt"

[classify]
already_done = ["nothing new"]

[[rule]]
name = "video"
pattern = "^https://video\\.example/"
command = "fetch"
args = ["--quiet", "{clipboard}"]
working_directory = "/tmp"
pause_after_run = false

[[rule]]
pattern = "\\.zip$"
command = "unzip"
parameter = "-o {clipboard}"
"#;

fn write_config(contents: &str) -> std::io::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    Ok(file)
}

#[test]
fn full_config_is_loaded_from_disk() -> TestResult {
    let file = write_config(FULL_CONFIG)?;
    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
    assert!(cfg.config.status_board);
    assert_eq!(
        cfg.source,
        SourceConfig::File {
            path: PathBuf::from("/tmp/shared.txt")
        }
    );
    assert_eq!(cfg.classify.already_done, vec!["nothing new"]);
    // Not given: defaults kept.
    assert!(cfg.classify.progress_prefixes.contains(&"[download]".to_string()));

    let rules: Vec<_> = cfg.rules.iter().collect();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].display_name(), "video");
    assert!(!rules[0].pause_after_run());
    assert_eq!(rules[0].working_directory(), Some("/tmp"));
    assert_eq!(rules[1].display_name(), "\\.zip$");
    assert!(rules[1].pause_after_run());
    assert_eq!(rules[1].args(), ["-o {clipboard}"]);
    Ok(())
}

#[test]
fn minimal_config_uses_defaults() -> TestResult {
    let raw = parse_str(
        r#"
[[rule]]
pattern = "x"
command = "echo"
"#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;

    assert_eq!(cfg.poll_interval(), Duration::from_millis(400));
    assert!(!cfg.config.pause_after_run);
    assert!(!cfg.config.status_board);
    assert_eq!(cfg.rules.placeholder(), "{clipboard}");
    assert!(matches!(cfg.source, SourceConfig::Command { ref cmd } if !cmd.is_empty()));
    Ok(())
}

#[test]
fn poll_interval_is_clamped() -> TestResult {
    let raw = parse_str(
        r#"
[config]
poll_interval_ms = 5

[[rule]]
pattern = "x"
command = "echo"
"#,
    )?;
    let cfg = ConfigFile::try_from(raw)?;
    assert_eq!(cfg.poll_interval(), Duration::from_millis(100));
    Ok(())
}

#[test]
fn config_without_rules_is_rejected() -> TestResult {
    let raw = parse_str("[config]\npoll_interval_ms = 400\n")?;
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(matches!(err, CliptriggerError::ConfigError(_)));
    Ok(())
}

#[test]
fn blank_command_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_rule(RuleConfigBuilder::new("x", "  ").build())
        .raw();
    let err = ConfigFile::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("empty `command`"));
}

#[test]
fn invalid_pattern_names_the_rule() {
    let raw = ConfigFileBuilder::new()
        .with_rule(RuleConfigBuilder::new("(unclosed", "echo").name("broken").build())
        .raw();
    match ConfigFile::try_from(raw) {
        Err(CliptriggerError::InvalidPattern { rule, .. }) => assert_eq!(rule, "broken"),
        other => panic!("expected InvalidPattern, got {other:?}"),
    }
}

#[test]
fn empty_source_command_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_source(SourceConfig::Command { cmd: vec![] })
        .with_rule(RuleConfigBuilder::new("x", "echo").build())
        .raw();
    assert!(ConfigFile::try_from(raw).is_err());
}

#[test]
fn malformed_toml_is_a_toml_error() {
    let err = parse_str("[[rule]\npattern = ").unwrap_err();
    assert!(matches!(err, CliptriggerError::TomlError(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_and_validate("/definitely/not/here/Cliptrigger.toml").unwrap_err();
    assert!(matches!(err, CliptriggerError::IoError(_)));
}

#[test]
fn rules_match_in_file_order_and_substitute_every_placeholder() {
    let cfg = ConfigFileBuilder::new()
        .with_rule(
            RuleConfigBuilder::new("^https://", "first")
                .arg("{clipboard}")
                .arg("--ref={clipboard}")
                .build(),
        )
        .with_rule(RuleConfigBuilder::new("example", "second").disabled().build())
        .with_rule(RuleConfigBuilder::new("EXAMPLE", "third").build())
        .with_rule(RuleConfigBuilder::new("EXAMPLE", "fourth").case_sensitive().build())
        .build();

    let specs = cfg.rules.match_text("https://example.org");
    let commands: Vec<_> = specs.iter().map(|s| s.command.as_str()).collect();
    assert_eq!(commands, vec!["first", "third"]);
    assert_eq!(
        specs[0].args,
        vec!["https://example.org", "--ref=https://example.org"]
    );
    assert_eq!(cfg.rules.enabled_count(), 3);
}

#[test]
fn custom_placeholder_and_pause_defaults_flow_into_job_specs() {
    let cfg = ConfigFileBuilder::new()
        .with_placeholder("%s")
        .with_pause_after_run(true)
        .with_rule(
            RuleConfigBuilder::new(".", "a")
                .arg("%s")
                .working_directory("/srv")
                .build(),
        )
        .with_rule(RuleConfigBuilder::new(".", "b").pause_after_run(false).build())
        .build();

    let specs = cfg.rules.match_text("hello");
    assert_eq!(specs[0].args, vec!["hello"]);
    assert_eq!(specs[0].working_directory.as_deref(), Some("/srv"));
    assert!(specs[0].pause_after_run);
    assert!(!specs[1].pause_after_run);
}

#[test]
fn legacy_parameter_is_used_only_without_args() {
    let cfg = ConfigFileBuilder::new()
        .with_rule(
            RuleConfigBuilder::new(".", "both")
                .arg("{clipboard}")
                .parameter("ignored {clipboard}")
                .build(),
        )
        .with_rule(RuleConfigBuilder::new(".", "legacy").parameter("-x {clipboard}").build())
        .with_rule(RuleConfigBuilder::new(".", "blank").parameter("   ").build())
        .build();

    let specs = cfg.rules.match_text("t");
    assert_eq!(specs[0].args, vec!["t"]);
    assert_eq!(specs[1].args, vec!["-x t"]);
    assert!(specs[2].args.is_empty());
}
