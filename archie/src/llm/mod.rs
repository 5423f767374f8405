//! Chat model backends
//!
//! The agent only needs one call: send the full message history, get the
//! assistant text back. [`ChatModel`] is that contract; Ollama and
//! OpenAI-compatible servers implement it.

mod client;
mod error;
mod ollama;
mod openai;
mod types;

use std::sync::Arc;
use tracing::debug;

pub use client::ChatModel;
#[cfg(test)]
pub use client::mock;
pub use error::LlmError;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use types::{ChatMessage, Role};

use crate::config::LlmConfig;

/// Create a chat model from configuration
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn ChatModel>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaClient::from_config(config)?)),
        "openai" => Ok(Arc::new(OpenAIClient::from_config(config)?)),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}
