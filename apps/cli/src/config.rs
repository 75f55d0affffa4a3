//! CLI configuration loading and merging.
//!
//! Configuration precedence:
//! 1. CLI arguments (handled by clap)
//! 2. Environment variables (`SKYHOOK_*`)
//! 3. Local config file (./.skyhookrc)
//! 4. Global config file (~/.skyhook/config.toml)

use serde::{Deserialize, Serialize};
use skyhook_hub::config::{
    API_URL_ENV, EXPERIMENT_ENV, MODEL_ENV, PIPELINE_ENV, TOKEN_ENV,
};
use skyhook_hub::{ConfigError, HubConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// On-disk CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Hub access token
    #[serde(default)]
    pub token: Option<String>,

    /// Hub base URL
    #[serde(default)]
    pub api_url: Option<String>,

    /// Default experiment name
    #[serde(default)]
    pub experiment: Option<String>,

    /// Default model name
    #[serde(default)]
    pub model: Option<String>,

    /// Default pipeline tag
    #[serde(default)]
    pub pipeline: Option<String>,
}

/// Errors that can occur during configuration file loading.
#[derive(Debug, Error)]
pub enum CliConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(String),

    #[error("failed to read configuration file: {0}")]
    ReadError(String),

    #[error("failed to parse configuration file: {0}")]
    ParseError(String),
}

/// Per-run overrides supplied as CLI flags.
#[derive(Debug, Clone, Default)]
pub struct HubOverrides {
    pub experiment: Option<String>,
    pub model: Option<String>,
    pub pipeline: Option<String>,
    pub api_url: Option<String>,
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, CliConfigError> {
        if !path.exists() {
            return Err(CliConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| CliConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| CliConfigError::ParseError(format!("{}: {}", path.display(), e)))
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".skyhook")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".skyhookrc")
    }

    /// Discover and load configuration files. Local config overrides global.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        if let Ok(global) = Self::load_from_file(&Self::default_global_path()) {
            config.merge(&global);
        }
        if let Ok(local) = Self::load_from_file(&Self::default_local_path()) {
            config.merge(&local);
        }

        config
    }

    /// Merge another configuration into this one; `other` wins where set.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref token) = other.token {
            self.token = Some(token.clone());
        }
        if let Some(ref api_url) = other.api_url {
            self.api_url = Some(api_url.clone());
        }
        if let Some(ref experiment) = other.experiment {
            self.experiment = Some(experiment.clone());
        }
        if let Some(ref model) = other.model {
            self.model = Some(model.clone());
        }
        if let Some(ref pipeline) = other.pipeline {
            self.pipeline = Some(pipeline.clone());
        }
    }
}

/// Resolves the hub configuration for a run from flags, environment, and
/// config files, in that precedence order.
pub fn resolve_hub_config(
    file: &CliConfig,
    overrides: &HubOverrides,
) -> Result<HubConfig, ConfigError> {
    resolve_with_env(file, overrides, |key| {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    })
}

fn resolve_with_env(
    file: &CliConfig,
    overrides: &HubOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<HubConfig, ConfigError> {
    let pick = |flag: &Option<String>,
                env_name: &'static str,
                stored: &Option<String>,
                name: &'static str| {
        flag.clone()
            .or_else(|| env(env_name))
            .or_else(|| stored.clone())
            .ok_or(ConfigError::Missing { name, env: env_name })
    };

    let config = HubConfig {
        base_url: pick(&overrides.api_url, API_URL_ENV, &file.api_url, "base URL")?,
        token: pick(&None, TOKEN_ENV, &file.token, "access token")?,
        experiment_name: pick(
            &overrides.experiment,
            EXPERIMENT_ENV,
            &file.experiment,
            "experiment name",
        )?,
        model_name: pick(&overrides.model, MODEL_ENV, &file.model, "model name")?,
        pipeline_tag: pick(&overrides.pipeline, PIPELINE_ENV, &file.pipeline, "pipeline tag")?,
    };
    config.validate()?;
    Ok(config)
}
