//! list_files tool - list a sandbox directory

use async_trait::async_trait;
use tracing::debug;

use super::kb;
use crate::tools::{ParamKind, ParamSpec, ParamValue, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// List files and folders in a directory, optionally filtered by a glob
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "list_files",
            "List files and folders in a directory. Use a glob pattern to filter names.",
        )
        .param(ParamSpec::with_default(
            "directory",
            ParamKind::Text,
            "Directory to list",
            ParamValue::Text(".".into()),
        ))
        .param(ParamSpec::with_default(
            "pattern",
            ParamKind::Text,
            "Glob pattern for names (e.g. *.txt)",
            ParamValue::Text("*".into()),
        ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "ListFilesTool::execute: called");
        let directory = params.text("directory").unwrap_or_else(|| ".".into());
        let pattern = params.text("pattern").unwrap_or_else(|| "*".into());

        let dir = ctx.resolve(&directory)?;
        let matcher = glob::Pattern::new(&pattern)
            .map_err(|e| ToolError::InvalidArgument(format!("Invalid glob pattern: {}", e)))?;

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut lines = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !matcher.matches(&name) {
                continue;
            }
            let meta = entry.metadata().await?;
            if meta.is_dir() {
                lines.push((name.clone(), format!("[DIR] {}", name)));
            } else {
                lines.push((name.clone(), format!("[FILE] {} ({})", name, kb(meta.len()))));
            }
        }
        debug!(count = lines.len(), "ListFilesTool::execute: entries matched");

        if lines.is_empty() {
            return Ok("Empty directory".to_string());
        }

        lines.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(lines.into_iter().map(|(_, line)| line).collect::<Vec<_>>().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::params_for;
    use std::fs;
    use tempfile::tempdir;

    fn params(pairs: &[(&str, &str)]) -> ToolParams {
        params_for(&ListFilesTool, pairs)
    }

    #[tokio::test]
    async fn test_list_files_basic() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("notes.txt"), "x".repeat(2048)).unwrap();
        fs::create_dir(temp.path().join("docs")).unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = ListFilesTool.execute(&params(&[]), &ctx).await.unwrap();

        assert_eq!(out, "[DIR] docs\n[FILE] notes.txt (2.0KB)");
    }

    #[tokio::test]
    async fn test_list_files_pattern() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.txt"), "").unwrap();
        fs::write(temp.path().join("b.pdf"), "").unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = ListFilesTool
            .execute(&params(&[("pattern", "*.pdf")]), &ctx)
            .await
            .unwrap();

        assert!(out.contains("b.pdf"));
        assert!(!out.contains("a.txt"));
    }

    #[tokio::test]
    async fn test_list_files_empty() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let out = ListFilesTool.execute(&params(&[]), &ctx).await.unwrap();
        assert_eq!(out, "Empty directory");
    }

    #[tokio::test]
    async fn test_list_files_outside_denied() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let err = ListFilesTool
            .execute(&params(&[("directory", "../..")]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AccessDenied { .. }));
    }
}
