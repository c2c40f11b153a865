//! Credential lookup for generation providers.
//!
//! Keys come from a `.env` secrets file (`~/.tandem/.env`) and, when enabled,
//! from the process environment. Lookups happen at call time so a key added
//! to the environment mid-session is picked up by the next turn.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::config::config_dir;

/// Environment key holding the Gemini API key.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

/// Environment key holding the OpenAI API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Provider credentials: a secrets map with optional process env fallback.
#[derive(Clone, Default)]
pub struct Credentials {
    vars: BTreeMap<String, String>,
    process_env: bool,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("keys", &self.vars.keys().collect::<Vec<_>>())
            .field("values", &"[REDACTED]")
            .field("process_env", &self.process_env)
            .finish()
    }
}

impl Credentials {
    /// Build credentials from a key-value map, without env fallback.
    pub fn from_map(vars: BTreeMap<String, String>) -> Self {
        Self {
            vars,
            process_env: false,
        }
    }

    /// Also consult the process environment when a key is not in the map.
    #[must_use]
    pub fn with_process_env(mut self) -> Self {
        self.process_env = true;
        self
    }

    /// Returns a non-blank credential value for a key, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        let from_map = self
            .vars
            .get(key)
            .filter(|value| !value.trim().is_empty())
            .cloned();
        if from_map.is_some() {
            return from_map;
        }
        if !self.process_env {
            return None;
        }
        std::env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    /// Whether a non-blank value exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Load credentials from a specific `.env` path. A missing file yields an
/// empty map.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be parsed.
pub fn load_credentials(path: &Path) -> anyhow::Result<Credentials> {
    if !path.exists() {
        debug!(path = %path.display(), "no secrets file, relying on environment");
        return Ok(Credentials::default());
    }

    let mut vars = BTreeMap::new();
    let iter = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read credentials at {}", path.display()))?;

    for item in iter {
        let (key, value) = item.with_context(|| {
            format!(
                "failed to parse key-value entry in credentials file {}",
                path.display()
            )
        })?;
        vars.insert(key, value);
    }

    Ok(Credentials::from_map(vars))
}

/// Load credentials from `~/.tandem/.env` with process env fallback.
///
/// # Errors
///
/// Returns an error when the home directory cannot be resolved or the secrets
/// file is malformed.
pub fn load_default_credentials() -> anyhow::Result<Credentials> {
    let path = config_dir()?.join(".env");
    Ok(load_credentials(&path)?.with_process_env())
}
