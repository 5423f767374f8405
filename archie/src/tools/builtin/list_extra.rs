//! list_extra tool - list the read-only extra directory, newest first

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::SystemTime;
use tracing::debug;

use crate::tools::{ParamKind, ParamSpec, ParamValue, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

pub(crate) const NO_EXTRA_DIR: &str = "No extra directory is configured. Set sandbox.extra-read-dir or EXTRA_READ_DIR";

#[derive(Debug, Serialize)]
struct ExtraEntry {
    name: String,
    size: String,
    modified: String,
}

/// List files in the extra read-only directory
pub struct ListExtraTool;

#[async_trait]
impl Tool for ListExtraTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "list_extra",
            "List files in the extra read-only directory (e.g. Downloads), newest first",
        )
        .param(ParamSpec::with_default(
            "pattern",
            ParamKind::Text,
            "Glob pattern (e.g. *.pdf, *.zip)",
            ParamValue::Text("*".into()),
        ))
        .param(ParamSpec::with_default(
            "limit",
            ParamKind::Number,
            "Maximum number of files to show",
            ParamValue::Number(20.0),
        ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "ListExtraTool::execute: called");
        let Ok(extra) = ctx.extra_dir() else {
            return Ok(NO_EXTRA_DIR.to_string());
        };
        let pattern = params.text("pattern").unwrap_or_else(|| "*".into());
        let limit = params.count("limit").unwrap_or(20);

        let full = extra.root().join(&pattern);
        let full = full
            .to_str()
            .ok_or_else(|| ToolError::InvalidArgument("Invalid pattern path".into()))?;
        let paths = glob::glob(full).map_err(|e| ToolError::InvalidArgument(format!("Invalid glob pattern: {}", e)))?;

        let mut files: Vec<(SystemTime, ExtraEntry)> = Vec::new();
        for path in paths.filter_map(|r| r.ok()) {
            if !path.canonicalize().is_ok_and(|c| c.starts_with(extra.root())) {
                continue;
            }
            let Ok(meta) = tokio::fs::metadata(&path).await else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((
                modified,
                ExtraEntry {
                    name: path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
                    size: format!("{:.2} MB", meta.len() as f64 / 1024.0 / 1024.0),
                    modified: DateTime::<Utc>::from(modified).to_rfc3339(),
                },
            ));
        }
        debug!(count = files.len(), "ListExtraTool::execute: files found");

        files.sort_by(|a, b| b.0.cmp(&a.0));
        let entries: Vec<ExtraEntry> = files.into_iter().take(limit).map(|(_, e)| e).collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}
