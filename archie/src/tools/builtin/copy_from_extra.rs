//! copy_from_extra tool - copy a file from the read-only directory into the sandbox

use async_trait::async_trait;
use std::path::Path;
use tracing::debug;

use super::list_extra::NO_EXTRA_DIR;
use crate::tools::{ParamKind, ParamSpec, ParamValue, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Copy a file out of the extra directory; writes only go through the sandbox
pub struct CopyFromExtraTool;

#[async_trait]
impl Tool for CopyFromExtraTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "copy_from_extra",
            "Copy a file from the extra read-only directory into the working directory",
        )
        .param(ParamSpec::required(
            "file",
            ParamKind::Text,
            "File name inside the extra directory",
        ))
        .param(ParamSpec::with_default(
            "destination",
            ParamKind::Text,
            "Destination folder in the sandbox",
            ParamValue::Text(".".into()),
        ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "CopyFromExtraTool::execute: called");
        let Ok(extra) = ctx.extra_dir() else {
            return Ok(NO_EXTRA_DIR.to_string());
        };
        let file = params.require_text("file")?;
        let destination = params.text("destination").unwrap_or_else(|| ".".into());

        let source = extra.resolve_read(&file)?;
        let meta = tokio::fs::metadata(&source)
            .await
            .map_err(|_| ToolError::NotFound { path: file.clone() })?;
        if !meta.is_file() {
            return Err(ToolError::InvalidArgument(format!("{} is not a file", file)));
        }

        let target = Path::new(&destination).join(&file);
        let dest = ctx.resolve(&target.to_string_lossy())?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&source, &dest).await?;
        debug!(?source, ?dest, "CopyFromExtraTool::execute: copied");

        Ok(format!("Copied: {} -> {}", file, ctx.relative(&dest)))
    }
}
