//! TOML-based configuration for conflictfix.
//!
//! Configuration is optional: every field has a default, so running without a
//! config file talks to the Anthropic Messages API with the key taken from
//! `ANTHROPIC_API_KEY`. The API key itself is never stored in the file; the
//! `api_key_env` field names the environment variable that holds it, and the
//! value is resolved at runtime via [`ResolverConfig::resolve_env_vars`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::prompt::SYSTEM_PROMPT;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Text-generation service settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

// ---------------------------------------------------------------------------
// LLM
// ---------------------------------------------------------------------------

/// Which hosted API to talk to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Anthropic Messages API.
    #[default]
    Anthropic,
    /// OpenRouter's OpenAI-compatible chat completions API.
    OpenRouter,
}

impl Provider {
    fn default_api_url(self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Self::Anthropic => "claude-3-7-sonnet-20250219",
            Self::OpenRouter => "anthropic/claude-3.7-sonnet",
        }
    }

    fn default_api_key_env(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenRouter => write!(f, "openrouter"),
        }
    }
}

/// Text-generation service configuration.
///
/// `api_url`, `model` and `api_key_env` default per provider; use the
/// `effective_*` accessors rather than reading the raw fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Hosted API to use.
    #[serde(default)]
    pub provider: Provider,

    /// API base URL override.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Model identifier override.
    #[serde(default)]
    pub model: Option<String>,

    /// Upper bound on generated tokens (default 8192).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (default 0.0, i.e. deterministic).
    #[serde(default)]
    pub temperature: f32,

    /// Environment variable holding the API key override.
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// `anthropic-version` header sent to the Anthropic API.
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,

    /// System-role instruction.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Resolved API key (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_max_tokens() -> u32 {
    8192
}
fn default_anthropic_version() -> String {
    "2023-06-01".into()
}
fn default_system_prompt() -> String {
    SYSTEM_PROMPT.into()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_url: None,
            model: None,
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            api_key_env: None,
            anthropic_version: default_anthropic_version(),
            system_prompt: default_system_prompt(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// API base URL without a trailing slash.
    pub fn effective_api_url(&self) -> String {
        self.api_url
            .as_deref()
            .unwrap_or(self.provider.default_api_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider.default_model())
    }

    pub fn effective_api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or(self.provider.default_api_key_env())
    }

    /// Return the resolved API key, or an error naming the variable to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::EnvVarMissing {
                var: self.effective_api_key_env().to_string(),
                field: "llm.api_key_env".into(),
            })
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl ResolverConfig {
    /// Load a [`ResolverConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ResolverConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Populate the API key from the environment variable named by
    /// `llm.api_key_env`.
    ///
    /// A missing variable only logs a warning here; the failure surfaces when
    /// a client is built via [`LlmConfig::require_api_key`].
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        let env_name = self.llm.effective_api_key_env().to_string();
        self.llm.api_key = resolve_optional_env(&env_name, "llm.api_key_env");
        Ok(())
    }

    /// Validate that all fields are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.effective_api_url().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        if self.llm.effective_model().trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.model".into(),
                detail: "model must not be empty".into(),
            });
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.max_tokens".into(),
                detail: "max_tokens must be > 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".into(),
                detail: format!("temperature must be within [0, 1], got {}", self.llm.temperature),
            });
        }

        Ok(())
    }

    /// Convenience: load (or default when `path` is `None`), resolve, and
    /// validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: Option<P>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => {
                debug!("no configuration file given, using defaults");
                Self::default()
            }
        };
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
