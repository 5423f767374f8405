//! ChatModel trait definition

use async_trait::async_trait;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{ChatMessage, LlmError};

/// Minimal chat contract: full message history in, assistant text out
///
/// Implementations must give up promptly with [`LlmError::Cancelled`] once
/// `cancel` fires; the agent never waits on an abandoned request.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Backend/model label for logs and the banner
    fn name(&self) -> String;

    /// Send the conversation and return the assistant reply
    async fn chat(&self, messages: &[ChatMessage], cancel: &CancellationToken) -> Result<String, LlmError>;
}

/// Race a request against the cancel token
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, request: F) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("cancellable: request abandoned");
            Err(LlmError::Cancelled)
        }
        result = request => result,
    }
}
