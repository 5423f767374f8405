//! move_file tool - move or rename inside the sandbox

use async_trait::async_trait;
use tracing::debug;

use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Move or rename a file or folder
pub struct MoveFileTool;

#[async_trait]
impl Tool for MoveFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("move_file", "Move or rename a file or folder")
            .param(ParamSpec::required("from", ParamKind::Text, "Current path"))
            .param(ParamSpec::required("to", ParamKind::Text, "New path"))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "MoveFileTool::execute: called");
        let from_arg = params.require_text("from")?;
        let to_arg = params.require_text("to")?;
        let from = ctx.resolve_entry(&from_arg)?;
        let to = ctx.resolve_entry(&to_arg)?;

        if from == ctx.root() {
            return Err(ToolError::InvalidArgument("Cannot move the sandbox root".into()));
        }
        if tokio::fs::symlink_metadata(&from).await.is_err() {
            return Err(ToolError::NotFound { path: from_arg });
        }

        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&from, &to).await?;
        debug!(?from, ?to, "MoveFileTool::execute: moved");

        Ok(format!("Moved: {} -> {}", ctx.relative(&from), ctx.relative(&to)))
    }
}
