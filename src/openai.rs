//! Chat completion client for the `OpenAI` API and compatible endpoints.

use log::{debug, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::chatbot::Completer;
use crate::config::Config;
use crate::error::{CompletionError, Result};
use crate::types::{MessageRole, Turn};

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: MessageRole,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

pub struct OpenAiClient {
    api_key: String,
    client: reqwest::Client,
    endpoint: String,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            api_key: config.openai_api_key.clone(),
            client,
            endpoint: format!("{}/chat/completions", config.openai_base_url),
            model: config.openai_model.clone(),
            system_prompt: config.system_prompt.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat_with_history(
        &self,
        history: &[Turn],
    ) -> std::result::Result<String, CompletionError> {
        if history.is_empty() {
            return Err(CompletionError::Unexpected(
                "completion requested with empty history".to_string(),
            ));
        }

        debug!(
            "Sending request to completion API with {} turns",
            history.len()
        );

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message {
            role: MessageRole::System,
            content: &self.system_prompt,
        });
        messages.extend(history.iter().map(|turn| Message {
            role: turn.role,
            content: &turn.content,
        }));

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            warn!("Completion API returned {status}");
            return Err(classify_failure(status, &body));
        }

        let api_response: ChatCompletionResponse = response.json().await?;

        let reply = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Unexpected("No choices in response".to_string()))?
            .message
            .content
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(CompletionError::Unexpected(
                "Completion contained no text".to_string(),
            ));
        }

        debug!("Received response from completion API");
        Ok(reply)
    }
}

impl Completer for OpenAiClient {
    async fn complete(&self, history: &[Turn]) -> std::result::Result<String, CompletionError> {
        self.chat_with_history(history).await
    }
}

/// Map a non-success response onto the completion error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    let api_error = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_default();
    let message = if api_error.message.is_empty() {
        body.to_string()
    } else {
        api_error.message
    };

    let code = api_error.code.as_deref().or(api_error.kind.as_deref());
    match code {
        Some("invalid_api_key" | "invalid_authentication") => {
            return CompletionError::Auth { status, message };
        }
        Some("insufficient_quota" | "rate_limit_exceeded" | "billing_hard_limit_reached") => {
            return CompletionError::Quota { status, message };
        }
        _ => {}
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CompletionError::Auth { status, message }
        }
        StatusCode::PAYMENT_REQUIRED | StatusCode::TOO_MANY_REQUESTS => {
            CompletionError::Quota { status, message }
        }
        StatusCode::REQUEST_TIMEOUT => CompletionError::Transient(format!("{status}: {message}")),
        status if status.is_server_error() => {
            CompletionError::Transient(format!("{status}: {message}"))
        }
        status => CompletionError::Unexpected(format!("{status}: {message}")),
    }
}
