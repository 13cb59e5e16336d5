//! OpenAI-compatible chat completion client
//!
//! Serves both configured providers; they differ only in endpoint, model
//! and whether JSON output is enforced server-side.
//! Uses a long-lived reqwest::Client for connection pooling.

use super::CompletionBackend;
use crate::config::ProviderConfig;
use crate::error::TickerError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Reusable chat completion client (connection-pooled)
pub struct ChatCompletionClient {
    client: Client,
    config: ProviderConfig,
}

impl ChatCompletionClient {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }

    fn build_request<'a>(&'a self, system_prompt: &'a str, user_content: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_content,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            response_format: self
                .config
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionClient {
    fn provider(&self) -> &str {
        &self.config.name
    }

    async fn complete(&self, system_prompt: &str, user_content: &str) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(TickerError::ConfigError(format!(
                "API key for provider '{}' not configured",
                self.config.name
            )));
        }

        let request = self.build_request(system_prompt, user_content);

        debug!(provider = %self.config.name, model = %self.config.model, "Calling chat completion API");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = %self.config.name, "Chat completion request failed: {}", e);
                TickerError::LlmError(format!("{} request failed: {}", self.config.name, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(provider = %self.config.name, %status, "Chat completion error response: {}", error_text);
            return Err(TickerError::LlmError(format!(
                "{} returned {}: {}",
                self.config.name, status, error_text
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            TickerError::MalformedResponse(format!("{} response body: {}", self.config.name, e))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                TickerError::MalformedResponse(format!("{} returned no choices", self.config.name))
            })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
