// src/config/mod.rs

//! Configuration loading and validation for cliptrigger.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it and compile rule patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    ClassifySection, ConfigFile, ConfigSection, RawConfigFile, RuleConfig, SourceConfig,
    DEFAULT_PLACEHOLDER, MIN_POLL_INTERVAL_MS,
};
