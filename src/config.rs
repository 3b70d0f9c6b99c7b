//! Engine configuration parsing and validation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Where the engine's standard error goes.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StderrMode {
    /// Left connected to the analyser's own stderr.
    #[default]
    Inherit,
    /// Discarded.
    Null,
}

fn default_search_depth() -> u32 {
    20
}

fn default_variations() -> u32 {
    1
}

fn default_new_game_command() -> String {
    "ucinewgame".into()
}

fn default_shutdown_grace_seconds() -> u64 {
    5
}

/// Engine configuration parsed from `analyser.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Engine executable, either a path or a name resolved through `PATH`.
    pub engine: PathBuf,
    /// Fixed depth used by every `go` command.
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,
    /// Number of principal variations requested (`MultiPV`).
    #[serde(default = "default_variations")]
    pub variations: u32,
    /// Command announcing a new game to the engine.
    #[serde(default = "default_new_game_command")]
    pub new_game_command: String,
    /// Bound on every sentinel wait; 0 means wait indefinitely.
    #[serde(default)]
    pub response_timeout_seconds: u64,
    /// How long teardown waits for the engine to exit after `quit`.
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
    /// Engine stderr handling.
    #[serde(default)]
    pub stderr: StderrMode,
    /// Extra engine options, sent in name order after the defaults.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl EngineConfig {
    /// Configuration for `engine` with every other field at its default.
    #[must_use]
    pub fn for_engine(engine: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            search_depth: default_search_depth(),
            variations: default_variations(),
            new_game_command: default_new_game_command(),
            response_timeout_seconds: 0,
            shutdown_grace_seconds: default_shutdown_grace_seconds(),
            stderr: StderrMode::default(),
            options: BTreeMap::new(),
        }
    }

    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Optional bound applied to every wait for an engine response.
    #[must_use]
    pub fn response_timeout(&self) -> Option<Duration> {
        (self.response_timeout_seconds > 0)
            .then(|| Duration::from_secs(self.response_timeout_seconds))
    }

    /// Grace period granted to the engine between `quit` and termination.
    #[must_use]
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_seconds)
    }

    /// Check the invariants the session relies on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.engine.as_os_str().is_empty() {
            return Err(AppError::Config("engine must not be empty".into()));
        }

        if self.search_depth == 0 {
            return Err(AppError::Config(
                "search_depth must be greater than zero".into(),
            ));
        }

        if self.variations == 0 {
            return Err(AppError::Config(
                "variations must be greater than zero".into(),
            ));
        }

        if self.new_game_command.trim().is_empty() {
            return Err(AppError::Config(
                "new_game_command must not be empty".into(),
            ));
        }

        for name in self.options.keys() {
            if name.trim().is_empty() || name.contains(" value ") {
                return Err(AppError::Config(format!("invalid option name: {name:?}")));
            }
        }

        Ok(())
    }
}
