//! `LanguageModel` over an OpenAI-compatible chat-completions endpoint.
//!
//! The request pins the reply to a strict JSON schema so the first choice's
//! content can be parsed straight into a [`StoryContinuation`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use storyloom_core::model::{ChatMessage, LanguageModel, ModelError, StoryContinuation};
use tracing::{debug, instrument, warn};

/// Upper bound on a single completion call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Chat-completions client producing story continuations.
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    /// Creates a client for `model` at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest::Error` if the HTTP client cannot be
    /// built (for example when no TLS backend is available).
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// The model identifier sent with every request.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    response_format: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

fn continuation_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "Continuation",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "text": { "type": "string" },
                    "image_prompt": { "type": "string" }
                },
                "required": ["text", "image_prompt"],
                "additionalProperties": false
            }
        }
    })
}

fn parse_reply(response: ChatResponse) -> Result<StoryContinuation, ModelError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ModelError::ContractViolation("reply has no choices".into()))?;
    let content = choice
        .message
        .content
        .ok_or_else(|| ModelError::ContractViolation("first choice has no content".into()))?;
    serde_json::from_str(content.trim())
        .map_err(|e| ModelError::ContractViolation(format!("content is not a continuation: {e}")))
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    #[instrument(skip(self, conversation), fields(model = %self.model, messages = conversation.len()))]
    async fn continue_story(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<StoryContinuation, ModelError> {
        let request = ChatRequest {
            model: &self.model,
            messages: conversation,
            response_format: continuation_format(),
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "chat completion request failed");
                ModelError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "chat completion rejected");
            return Err(ModelError::Transport(format!("HTTP {status}: {body}")));
        }

        let envelope: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::ContractViolation(format!("unreadable reply: {e}")))?;
        debug!(choices = envelope.choices.len(), "chat completion received");
        parse_reply(envelope)
    }
}
