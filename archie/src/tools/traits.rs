//! Tool trait definition

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::ToolError;
use super::context::ToolContext;
use super::params::ToolParams;
use super::schema::ToolDescriptor;

/// A tool the model can call through the marker protocol
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and declared parameters
    fn descriptor(&self) -> ToolDescriptor;

    /// Execute with validated, coerced parameters
    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError>;
}

/// Result of a tool execution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(content: impl Into<String>) -> Self {
        debug!("ToolResult::success: called");
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(content: impl Into<String>) -> Self {
        debug!("ToolResult::error: called");
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}
