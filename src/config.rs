//! Configuration loading and validation.
//!
//! Settings come from `~/.tandem/config.toml` (or an explicit path).
//! Environment variables override file values; file values override defaults.
//!
//! Precedence: env vars > config file > defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

/// Name of the per-user configuration directory under `$HOME`.
const CONFIG_DIR_NAME: &str = ".tandem";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Generation model selection.
    pub models: ModelsConfig,

    /// Experiment defaults and log destination.
    pub experiment: ExperimentConfig,

    /// Limits applied to each generation call.
    pub generation: GenerationConfig,
}

/// Model selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Model spec in `<provider>/<model>` form (e.g. "gemini/gemini-1.5-flash").
    pub default: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
        }
    }
}

/// Experiment defaults used when a session starts without explicit parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Condition used when none is supplied.
    pub default_condition: String,

    /// Participant identifier used when none is supplied.
    pub default_participant: String,

    /// Path of the append-only CSV turn log.
    pub log_path: PathBuf,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            default_condition: default_condition(),
            default_participant: default_participant(),
            log_path: default_log_path(),
        }
    }
}

/// Generation call limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Timeout for a single provider call in seconds. `0` disables it.
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    /// The provider call timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_secs > 0).then(|| std::time::Duration::from_secs(self.timeout_secs))
    }
}

// Default value functions for serde

fn default_model() -> String {
    "gemini/gemini-1.5-flash".to_owned()
}
fn default_condition() -> String {
    "acceptance".to_owned()
}
fn default_participant() -> String {
    "anon".to_owned()
}
fn default_log_path() -> PathBuf {
    PathBuf::from("chat_logs.csv")
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Parse a TOML string into config.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or has mistyped fields.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("failed to parse config TOML")
    }

    /// Apply environment variable overrides (env > config > defaults).
    ///
    /// Takes a resolver function so tests never touch the process environment.
    pub fn apply_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("TANDEM_MODEL") {
            self.models.default = v;
        }
        if let Some(v) = env("TANDEM_CONDITION") {
            self.experiment.default_condition = v;
        }
        if let Some(v) = env("TANDEM_LOG_PATH") {
            self.experiment.log_path = PathBuf::from(v);
        }
        if let Some(v) = env("TANDEM_TIMEOUT_SECS") {
            match v.parse() {
                Ok(n) => self.generation.timeout_secs = n,
                Err(_) => tracing::warn!(
                    var = "TANDEM_TIMEOUT_SECS",
                    value = %v,
                    "ignoring invalid env override"
                ),
            }
        }
    }
}

/// Load config from a TOML file. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            tracing::debug!(path = %path.display(), "loading config from file");
            toml::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => Err(anyhow::anyhow!(
            "failed to read config at {}: {e}",
            path.display()
        )),
    }
}

/// Load config from `path` (or the default location) and apply process
/// environment overrides.
///
/// # Errors
///
/// Returns an error if the home directory cannot be resolved or the file is
/// invalid.
pub fn load_effective_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_dir()?.join("config.toml"),
    };
    let mut config = load_config(&path)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    Ok(config)
}

/// Resolve the default config directory (`~/.tandem/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(CONFIG_DIR_NAME))
}
