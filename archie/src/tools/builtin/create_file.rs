//! create_file tool - write a new file in the sandbox

use async_trait::async_trait;
use tracing::debug;

use super::kb;
use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Create a file with the given content, creating parent folders as needed
pub struct CreateFileTool;

#[async_trait]
impl Tool for CreateFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("create_file", "Create a new file with the given content")
            .param(ParamSpec::required(
                "name",
                ParamKind::Text,
                "File name or path (e.g. notes.txt, docs/report.md)",
            ))
            .param(ParamSpec::required("content", ParamKind::Text, "Content of the file"))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "CreateFileTool::execute: called");
        let path = ctx.resolve(&params.require_text("name")?)?;
        let content = params.require_text("content")?;

        if path == ctx.root() {
            return Err(ToolError::InvalidArgument("A file name is required".into()));
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content.as_bytes()).await?;

        let size = tokio::fs::metadata(&path).await?.len();
        debug!(?path, size, "CreateFileTool::execute: file written");
        Ok(format!("File created: {} ({})", ctx.relative(&path), kb(size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::params_for;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_file_with_parents() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = CreateFileTool
            .execute(
                &params_for(&CreateFileTool, &[("name", "docs/todo.md"), ("content", "- buy milk\n- call mom")]),
                &ctx,
            )
            .await
            .unwrap();

        assert!(out.starts_with("File created: docs/todo.md"));
        assert_eq!(
            fs::read_to_string(temp.path().join("docs/todo.md")).unwrap(),
            "- buy milk\n- call mom"
        );
    }

    #[tokio::test]
    async fn test_numeric_content_written_as_text() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        CreateFileTool
            .execute(&params_for(&CreateFileTool, &[("name", "year.txt"), ("content", "2024")]), &ctx)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(temp.path().join("year.txt")).unwrap(), "2024");
    }

    #[tokio::test]
    async fn test_create_file_outside_denied() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let err = CreateFileTool
            .execute(&params_for(&CreateFileTool, &[("name", "../evil.txt"), ("content", "x")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AccessDenied { .. }));
    }
}
