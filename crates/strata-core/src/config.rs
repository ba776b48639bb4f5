//! Configuration
//!
//! [`StrataConfig`] is layered: built-in defaults, then an optional TOML
//! file, then `STRATA_*` environment variables. Callers (the CLI) apply
//! their own flags last through the `with_*` setters.
//!
//! ```toml
//! workspace_root = "sites"
//! fallback_image = "placeholder.png"
//!
//! [generation]
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! model = "gpt-4o-mini"
//! timeout_secs = 90
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`StrataConfig::workspace_root`]
pub const ENV_WORKSPACE_ROOT: &str = "STRATA_WORKSPACE_ROOT";
/// Environment variable overriding [`GenerationConfig::endpoint`]
pub const ENV_ENDPOINT: &str = "STRATA_ENDPOINT";
/// Environment variable overriding [`GenerationConfig::model`]
pub const ENV_MODEL: &str = "STRATA_MODEL";
/// Environment variable overriding [`GenerationConfig::timeout_secs`]
pub const ENV_TIMEOUT: &str = "STRATA_TIMEOUT_SECS";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataConfig {
    /// Directory holding one subdirectory per target
    pub workspace_root: PathBuf,
    /// Image shown by the fallback artifact
    pub fallback_image: Option<String>,
    /// On a failed later round, keep the previous artifact instead of
    /// replacing it with the fallback template
    pub keep_prior_on_failure: bool,
    /// Generation service settings
    pub generation: GenerationConfig,
}

impl StrataConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|var| std::env::var(var).ok())
    }

    /// Parse a TOML file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `STRATA_*` overrides read through `lookup`
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(root) = lookup(ENV_WORKSPACE_ROOT) {
            self.workspace_root = PathBuf::from(root);
        }
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.generation.endpoint = endpoint;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.generation.model = model;
        }
        if let Some(value) = lookup(ENV_TIMEOUT) {
            self.generation.timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_TIMEOUT.to_owned(),
                    value,
                })?;
        }
        Ok(self)
    }

    /// With workspace root
    #[inline]
    #[must_use]
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// With fallback image
    #[inline]
    #[must_use]
    pub fn with_fallback_image(mut self, image: impl Into<String>) -> Self {
        self.fallback_image = Some(image.into());
        self
    }

    /// With generation settings
    #[inline]
    #[must_use]
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }
}

impl Default for StrataConfig {
    fn default() -> Self {
        Self {
            workspace_root: PathBuf::from("sites"),
            fallback_image: None,
            keep_prior_on_failure: false,
            generation: GenerationConfig::default(),
        }
    }
}

/// Generation service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Completion token limit
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
}

impl GenerationConfig {
    /// Request timeout
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With timeout in seconds
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_owned(),
            model: "gpt-4o-mini".to_owned(),
            max_tokens: 4000,
            temperature: 0.7,
            timeout_secs: 120,
            api_key_env: "OPENAI_API_KEY".to_owned(),
        }
    }
}
