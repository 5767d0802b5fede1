// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Server configuration.
//!
//! Precedence, highest first: CLI flags, environment, TOML file, defaults.
//!
//! ```toml
//! bind = "0.0.0.0:8000"
//! artifacts = "artifacts"
//! catalog = "products.json"
//!
//! [narrative]
//! deadline_secs = 60
//! max_in_flight = 8
//! api_key_env = "GEMINI_API_KEY"
//! models = ["gemini-1.5-flash", "gemini-1.5-pro"]
//! ```
//!
//! The API key itself never lives in the file. `api_key_env` names the
//! environment variable to read it from.

use std::collections::HashMap;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corpus::ArtifactPaths;

/// Environment variable overriding `bind`.
pub const ENV_BIND: &str = "SHORTLIST_BIND";

/// Environment variable overriding `artifacts`.
pub const ENV_ARTIFACTS: &str = "SHORTLIST_ARTIFACTS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML in {origin}: {source}")]
    Parse {
        origin: String,
        source: toml::de::Error,
    },

    #[error("invalid value for {field}: '{value}' ({reason})")]
    Invalid {
        field: String,
        value: String,
        reason: String,
    },
}

// ============================================================================
// SETTINGS
// ============================================================================

/// Narrative provider settings (`[narrative]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NarrativeSettings {
    /// Hard wall-clock deadline per synthesis, in seconds.
    pub deadline_secs: u64,
    /// Concurrent provider calls allowed.
    pub max_in_flight: usize,
    pub api_base: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Model names in preference order. The first available one is used.
    pub models: Vec<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            deadline_secs: 60,
            max_in_flight: 8,
            api_base: "https://generativelanguage.googleapis.com".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            models: vec!["gemini-1.5-flash".to_string(), "gemini-1.5-pro".to_string()],
            temperature: 0.5,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 2048,
        }
    }
}

impl NarrativeSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    /// The API key, if its variable is set and non-blank.
    pub fn api_key(&self, env: &HashMap<String, String>) -> Option<String> {
        env.get(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

/// Everything `shortlist serve` needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory holding `index.slx` and `metadata.json`.
    pub artifacts: PathBuf,
    /// Raw catalog used when `metadata.json` is missing. Relative paths
    /// resolve against the working directory.
    pub catalog: PathBuf,
    pub narrative: NarrativeSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            artifacts: PathBuf::from("artifacts"),
            catalog: PathBuf::from("products.json"),
            narrative: NarrativeSettings::default(),
        }
    }
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub artifacts: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_toml_str(toml_str: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Resolve the final configuration from all sources and validate it.
    pub fn load(
        file: Option<&Path>,
        env: &HashMap<String, String>,
        cli: &CliOverrides,
    ) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env);
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Apply `SHORTLIST_*` overrides. Returns the variables that were used.
    pub fn apply_env(&mut self, env: &HashMap<String, String>) -> Vec<&'static str> {
        let mut used = Vec::new();
        if let Some(bind) = env.get(ENV_BIND) {
            self.bind.clone_from(bind);
            used.push(ENV_BIND);
        }
        if let Some(artifacts) = env.get(ENV_ARTIFACTS) {
            self.artifacts = PathBuf::from(artifacts);
            used.push(ENV_ARTIFACTS);
        }
        used
    }

    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(bind) = &cli.bind {
            self.bind.clone_from(bind);
        }
        if let Some(artifacts) = &cli.artifacts {
            self.artifacts.clone_from(artifacts);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.narrative.deadline_secs == 0 {
            return Err(invalid("narrative.deadline_secs", "0", "must be at least 1"));
        }
        if self.narrative.max_in_flight == 0 {
            return Err(invalid("narrative.max_in_flight", "0", "must be at least 1"));
        }
        if self.narrative.models.iter().all(|m| m.trim().is_empty()) {
            return Err(invalid("narrative.models", "[]", "list at least one model name"));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .parse()
            .map_err(|_| invalid("bind", &self.bind, "expected host:port, e.g. 127.0.0.1:8000"))
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.artifacts).with_catalog(&self.catalog)
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
