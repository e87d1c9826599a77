//! Error types for the conflictfix core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

/// Errors from a single in-place resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The target file could not be read. No service call was made.
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text-generation service call failed.
    #[error("text-generation service failed: {0}")]
    Service(#[from] LlmError),

    /// The resolved text could not be written back.
    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// LLM service errors
// ---------------------------------------------------------------------------

/// Errors from the hosted text-generation API.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("LLM HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("LLM API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// API key is missing or rejected.
    #[error("LLM authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Rate limit or quota exceeded.
    #[error("LLM rate limit exceeded, retry after {retry_after}")]
    RateLimited { retry_after: String },

    /// The response body was not the expected JSON.
    #[error("LLM response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing { var: String, field: String },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = LlmError::ApiError {
            status: 529,
            body: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "LLM API error (HTTP 529): overloaded");

        let err = LlmError::RateLimited {
            retry_after: "30".into(),
        };
        assert!(err.to_string().contains("rate limit"));

        let err = ConfigError::EnvVarMissing {
            var: "ANTHROPIC_API_KEY".into(),
            field: "llm.api_key_env".into(),
        };
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        let err = ResolveError::Read {
            path: PathBuf::from("/tmp/missing.rs"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().starts_with("failed to read '/tmp/missing.rs'"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let llm_err = LlmError::AuthenticationFailed("HTTP 401".into());
        let core_err: CoreError = llm_err.into();
        assert!(matches!(core_err, CoreError::Llm(_)));

        let resolve_err: ResolveError = LlmError::ParseError("eof".into()).into();
        assert!(matches!(resolve_err, ResolveError::Service(_)));
        let core_err: CoreError = resolve_err.into();
        assert!(matches!(core_err, CoreError::Resolve(_)));
    }
}
