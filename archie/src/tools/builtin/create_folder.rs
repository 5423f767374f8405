//! create_folder tool

use async_trait::async_trait;
use tracing::debug;

use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Create a folder, including missing parents
pub struct CreateFolderTool;

#[async_trait]
impl Tool for CreateFolderTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("create_folder", "Create a new folder")
            .param(ParamSpec::required("path", ParamKind::Text, "Path of the folder to create"))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "CreateFolderTool::execute: called");
        let path = ctx.resolve(&params.require_text("path")?)?;
        tokio::fs::create_dir_all(&path).await?;
        Ok(format!("Folder created: {}", ctx.relative(&path)))
    }
}
