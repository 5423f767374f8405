//! Ollama chat API client
//!
//! Talks to a local Ollama server through `POST /api/chat` with streaming
//! disabled, so each call returns one complete assistant message.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::client::cancellable;
use super::{ChatMessage, ChatModel, LlmError};
use crate::config::LlmConfig;

/// Ollama API client
pub struct OllamaClient {
    model: String,
    base_url: String,
    temperature: f32,
    http: Client,
    timeout: Duration,
}

impl OllamaClient {
    /// Create a new client from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "OllamaClient::from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            http,
            timeout,
        })
    }

    /// Build the request body for the Ollama API
    fn build_request_body(&self, messages: &[ChatMessage]) -> serde_json::Value {
        debug!(%self.model, message_count = messages.len(), "OllamaClient::build_request_body: called");
        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": {
                "temperature": self.temperature,
            },
        })
    }

    async fn send(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.build_request_body(messages);

        let response = self.http.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(%status, "OllamaClient::send: API error");
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let api_response: OllamaResponse = response.json().await?;
        api_response
            .message
            .map(|m| m.content)
            .ok_or_else(|| LlmError::InvalidResponse("Response has no message".to_string()))
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    fn name(&self) -> String {
        format!("ollama/{}", self.model)
    }

    async fn chat(&self, messages: &[ChatMessage], cancel: &CancellationToken) -> Result<String, LlmError> {
        debug!(%self.model, message_count = messages.len(), "OllamaClient::chat: called");
        cancellable(cancel, self.send(messages)).await
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: Option<OllamaMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}
