//! file_info tool - metadata for a sandbox path as JSON

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs::Metadata;
use tracing::debug;

use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Show detailed information about a file or folder
pub struct FileInfoTool;

#[cfg(unix)]
fn permissions(meta: &Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permissions(meta: &Metadata) -> String {
    if meta.permissions().readonly() { "readonly" } else { "readwrite" }.to_string()
}

fn timestamp(time: std::io::Result<std::time::SystemTime>) -> Option<String> {
    time.ok().map(|t| DateTime::<Utc>::from(t).to_rfc3339())
}

#[async_trait]
impl Tool for FileInfoTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("file_info", "Get detailed information about a file or folder")
            .param(ParamSpec::required("path", ParamKind::Text, "Path of the file"))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "FileInfoTool::execute: called");
        let arg = params.require_text("path")?;
        let path = ctx.resolve(&arg)?;
        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|_| ToolError::NotFound { path: arg })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        let info = serde_json::json!({
            "name": name,
            "path": ctx.relative(&path),
            "kind": if meta.is_dir() { "folder" } else { "file" },
            "size": format!("{:.2} KB", meta.len() as f64 / 1024.0),
            "created": timestamp(meta.created()),
            "modified": timestamp(meta.modified()),
            "permissions": permissions(&meta),
        });

        Ok(serde_json::to_string_pretty(&info)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::params_for;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_info_file() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/report.txt"), vec![b'a'; 2048]).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = FileInfoTool
            .execute(&params_for(&FileInfoTool, &[("path", "docs/report.txt")]), &ctx)
            .await
            .unwrap();
        let info: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(info["name"], "report.txt");
        assert_eq!(info["path"], "docs/report.txt");
        assert_eq!(info["kind"], "file");
        assert_eq!(info["size"], "2.00 KB");
        assert!(info["modified"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_file_info_folder() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = FileInfoTool
            .execute(&params_for(&FileInfoTool, &[("path", "docs")]), &ctx)
            .await
            .unwrap();
        let info: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(info["kind"], "folder");
    }

    #[tokio::test]
    async fn test_file_info_missing() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let err = FileInfoTool
            .execute(&params_for(&FileInfoTool, &[("path", "ghost.txt")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound { .. }));
    }
}
