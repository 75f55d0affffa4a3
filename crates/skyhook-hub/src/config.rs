//! Hub connection configuration.
//!
//! Configuration is an explicit struct constructed once at process start and
//! passed into the clients - nothing in this crate reads ambient state after
//! construction.

use thiserror::Error;

/// Environment variable carrying the hub access token.
pub const TOKEN_ENV: &str = "SKYHOOK_TOKEN";
/// Environment variable carrying the hub base URL.
pub const API_URL_ENV: &str = "SKYHOOK_API_URL";
/// Environment variable carrying the experiment name.
pub const EXPERIMENT_ENV: &str = "SKYHOOK_EXPERIMENT";
/// Environment variable carrying the model name.
pub const MODEL_ENV: &str = "SKYHOOK_MODEL";
/// Environment variable carrying the pipeline tag.
pub const PIPELINE_ENV: &str = "SKYHOOK_PIPELINE";

/// Errors raised while assembling configuration, before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required configuration value `{name}` is missing (set {env} or pass it explicitly)")]
    Missing { name: &'static str, env: &'static str },

    #[error("invalid base URL `{0}`: expected an http(s) URL")]
    InvalidBaseUrl(String),
}

/// Everything a publish run needs to talk to the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Base URL of the control API, e.g. `https://hub.example.com`.
    pub base_url: String,
    /// Access token sent as `Authorization: Token <token>`.
    pub token: String,
    /// Experiment the run belongs to.
    pub experiment_name: String,
    /// Model the artifacts were produced by.
    pub model_name: String,
    /// Pipeline tag, e.g. `text-classification`.
    pub pipeline_tag: String,
}

impl HubConfig {
    /// Builds a configuration from the `SKYHOOK_*` environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` for the first absent variable, or
    /// `ConfigError::InvalidBaseUrl` if the URL does not look like http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &'static str, env: &'static str| {
            std::env::var(env)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing { name, env })
        };

        let config = Self {
            base_url: var("base URL", API_URL_ENV)?,
            token: var("access token", TOKEN_ENV)?,
            experiment_name: var("experiment name", EXPERIMENT_ENV)?,
            model_name: var("model name", MODEL_ENV)?,
            pipeline_tag: var("pipeline tag", PIPELINE_ENV)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is present and the base URL is plausible.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required: [(&'static str, &'static str, &str); 5] = [
            ("base URL", API_URL_ENV, &self.base_url),
            ("access token", TOKEN_ENV, &self.token),
            ("experiment name", EXPERIMENT_ENV, &self.experiment_name),
            ("model name", MODEL_ENV, &self.model_name),
            ("pipeline tag", PIPELINE_ENV, &self.pipeline_tag),
        ];
        for (name, env, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing { name, env });
            }
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        Ok(())
    }

    /// Joins an API path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}
