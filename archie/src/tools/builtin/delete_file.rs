//! delete_file tool - remove a file or empty folder, only when confirmed

use async_trait::async_trait;
use tracing::debug;

use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Delete a file or an empty folder
pub struct DeleteFileTool;

#[async_trait]
impl Tool for DeleteFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("delete_file", "Delete a file or an empty folder. USE WITH CARE.")
            .param(ParamSpec::required("path", ParamKind::Text, "Path to delete"))
            .param(ParamSpec::required(
                "confirm",
                ParamKind::Bool,
                "Must be true to confirm the deletion",
            ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "DeleteFileTool::execute: called");
        if !params.flag("confirm") {
            debug!("DeleteFileTool::execute: not confirmed");
            return Ok("Deletion cancelled. Set confirm to true to delete".to_string());
        }

        let arg = params.require_text("path")?;
        let path = ctx.resolve_entry(&arg)?;
        if path == ctx.root() {
            return Err(ToolError::InvalidArgument("Cannot delete the sandbox root".into()));
        }

        let meta = tokio::fs::symlink_metadata(&path)
            .await
            .map_err(|_| ToolError::NotFound { path: arg.clone() })?;
        if meta.is_dir() {
            // Only empty folders
            tokio::fs::remove_dir(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }

        Ok(format!("Deleted: {}", ctx.relative(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::params_for;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_delete_requires_confirm() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = DeleteFileTool
            .execute(&params_for(&DeleteFileTool, &[("path", "a.txt"), ("confirm", "false")]), &ctx)
            .await
            .unwrap();

        assert!(out.starts_with("Deletion cancelled"));
        assert!(temp.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_file() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = DeleteFileTool
            .execute(&params_for(&DeleteFileTool, &[("path", "a.txt"), ("confirm", "true")]), &ctx)
            .await
            .unwrap();

        assert_eq!(out, "Deleted: a.txt");
        assert!(!temp.path().join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_non_empty_folder_fails() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/a.txt"), "x").unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let err = DeleteFileTool
            .execute(&params_for(&DeleteFileTool, &[("path", "docs"), ("confirm", "true")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
        assert!(temp.path().join("docs/a.txt").exists());
    }

    #[tokio::test]
    async fn test_delete_root_refused() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let err = DeleteFileTool
            .execute(&params_for(&DeleteFileTool, &[("path", "."), ("confirm", "true")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_symlink_keeps_target() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("important.txt"), "keep").unwrap();
        std::os::unix::fs::symlink(temp.path().join("important.txt"), temp.path().join("shortcut.txt")).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = DeleteFileTool
            .execute(&params_for(&DeleteFileTool, &[("path", "shortcut.txt"), ("confirm", "true")]), &ctx)
            .await
            .unwrap();

        assert_eq!(out, "Deleted: shortcut.txt");
        assert!(temp.path().join("shortcut.txt").symlink_metadata().is_err());
        assert_eq!(fs::read_to_string(temp.path().join("important.txt")).unwrap(), "keep");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_delete_symlink_to_folder_keeps_contents() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/a.txt"), "x").unwrap();
        std::os::unix::fs::symlink(temp.path().join("docs"), temp.path().join("docs_link")).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        DeleteFileTool
            .execute(&params_for(&DeleteFileTool, &[("path", "docs_link"), ("confirm", "true")]), &ctx)
            .await
            .unwrap();

        assert!(temp.path().join("docs_link").symlink_metadata().is_err());
        assert!(temp.path().join("docs/a.txt").exists());
    }
}
