//! Text-generation service seam and its hosted-API clients.

pub mod anthropic;
pub mod openrouter;
pub mod types;

use std::future::Future;

use tracing::{info, warn};

use crate::config::{LlmConfig, Provider};
use crate::errors::{CoreError, LlmError};

pub use anthropic::AnthropicClient;
pub use openrouter::OpenRouterClient;
pub use types::{ContentBlock, Message, MessageRequest, MessageResponse, ResponseBlock, Role};

/// Anything that can turn a [`MessageRequest`] into a [`MessageResponse`].
pub trait TextGenerator {
    fn generate(
        &self,
        request: &MessageRequest,
    ) -> impl Future<Output = Result<MessageResponse, LlmError>> + Send;
}

/// The configured hosted client.
#[derive(Clone)]
pub enum Generator {
    Anthropic(AnthropicClient),
    OpenRouter(OpenRouterClient),
}

impl TextGenerator for Generator {
    async fn generate(&self, request: &MessageRequest) -> Result<MessageResponse, LlmError> {
        match self {
            Self::Anthropic(client) => client.generate(request).await,
            Self::OpenRouter(client) => client.generate(request).await,
        }
    }
}

/// Build the client selected by `config.provider`.
///
/// Fails with [`ConfigError::EnvVarMissing`](crate::errors::ConfigError::EnvVarMissing) when no API key was resolved.
pub fn build_generator(config: &LlmConfig) -> Result<Generator, CoreError> {
    let api_key = config.require_api_key()?;
    let api_url = config.effective_api_url();
    info!(provider = %config.provider, model = config.effective_model(), "building LLM client");

    let generator = match config.provider {
        Provider::Anthropic => Generator::Anthropic(AnthropicClient::new(
            api_url,
            api_key,
            config.anthropic_version.clone(),
        )?),
        Provider::OpenRouter => Generator::OpenRouter(OpenRouterClient::new(api_url, api_key)?),
    };
    Ok(generator)
}

/// Map a non-success HTTP status to an [`LlmError`], passing successful
/// responses through.
pub(crate) async fn check_response(
    resp: reqwest::Response,
) -> Result<reqwest::Response, LlmError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(LlmError::AuthenticationFailed(format!("HTTP {}", status)));
    }
    if status.as_u16() == 429 {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        return Err(LlmError::RateLimited { retry_after });
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "LLM API returned error");
    Err(LlmError::ApiError {
        status: status.as_u16(),
        body,
    })
}
