//! OpenRouter (OpenAI-compatible chat completions) client.
//!
//! Requests are translated from the Messages shape, and the first choice is
//! mapped back into a single content block so the resolver sees one response
//! format regardless of provider.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::types::{lenient_seq, lenient_string, MessageRequest, MessageResponse, ResponseBlock};
use super::{check_response, TextGenerator};
use crate::errors::LlmError;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default, deserialize_with = "lenient_seq")]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatChoiceMessage,
    #[serde(default, deserialize_with = "lenient_string")]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default, deserialize_with = "lenient_string")]
    content: Option<String>,
}

impl ChatResponse {
    /// Same contract as [`MessageResponse::from_body`].
    fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(body)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }
}

impl From<ChatResponse> for MessageResponse {
    fn from(resp: ChatResponse) -> Self {
        let first = resp.choices.into_iter().next();
        let stop_reason = first.as_ref().and_then(|c| c.finish_reason.clone());
        let content = match first {
            Some(choice) => vec![ResponseBlock {
                kind: Some("text".into()),
                text: choice.message.content,
            }],
            None => Vec::new(),
        };
        MessageResponse {
            content,
            stop_reason,
        }
    }
}

/// Asynchronous client for `POST /chat/completions`.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("conflictfix/", env!("CARGO_PKG_VERSION"))),
        );
        let http = reqwest::Client::builder().default_headers(headers).build()?;
        info!(api_url = %api_url, "created OpenRouterClient");
        Ok(Self {
            http,
            api_url,
            api_key: api_key.into(),
        })
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn chat_completion(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, LlmError> {
        let url = format!("{}/chat/completions", self.api_url);
        let body = to_chat_request(request);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let text = resp.text().await?;
        let chat =
            ChatResponse::from_body(&text).map_err(|e| LlmError::ParseError(e.to_string()))?;
        debug!(choices = chat.choices.len(), "received chat completion");
        Ok(chat.into())
    }
}

fn to_chat_request(request: &MessageRequest) -> ChatRequest<'_> {
    ChatRequest {
        model: &request.model,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        messages: vec![
            ChatMessage {
                role: "system",
                content: request.system.clone(),
            },
            ChatMessage {
                role: "user",
                content: request.user_text(),
            },
        ],
    }
}

impl TextGenerator for OpenRouterClient {
    async fn generate(&self, request: &MessageRequest) -> Result<MessageResponse, LlmError> {
        self.chat_completion(request).await
    }
}
