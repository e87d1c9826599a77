//! Anthropic Messages API client.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, info, instrument};

use super::types::{MessageRequest, MessageResponse};
use super::{check_response, TextGenerator};
use crate::errors::LlmError;

/// Asynchronous client for `POST /v1/messages`.
#[derive(Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    version: String,
}

impl AnthropicClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, LlmError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("conflictfix/", env!("CARGO_PKG_VERSION"))),
        );
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        info!(api_url = %api_url, "created AnthropicClient");
        Ok(Self {
            http,
            api_url,
            api_key: api_key.into(),
            version: version.into(),
        })
    }

    /// Send one Messages request and decode the response body.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn create_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, LlmError> {
        let url = format!("{}/v1/messages", self.api_url);
        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.version)
            .json(request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let body = resp.text().await?;
        let message =
            MessageResponse::from_body(&body).map_err(|e| LlmError::ParseError(e.to_string()))?;
        debug!(
            blocks = message.content.len(),
            stop_reason = message.stop_reason.as_deref().unwrap_or("none"),
            "received message"
        );
        Ok(message)
    }
}

impl TextGenerator for AnthropicClient {
    async fn generate(&self, request: &MessageRequest) -> Result<MessageResponse, LlmError> {
        self.create_message(request).await
    }
}
