//! search_files tool - case-insensitive text search across sandbox files

use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

use super::truncate_chars;
use crate::tools::{ParamKind, ParamSpec, ParamValue, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Characters of a matching line kept in a hit
const MAX_LINE_CHARS: usize = 100;

#[derive(Debug, Serialize)]
struct SearchHit {
    file: String,
    line: usize,
    content: String,
}

/// Search for text inside files matched by a glob
pub struct SearchFilesTool;

impl SearchFilesTool {
    /// Regular files under the root whose relative path matches, capped at `limit`
    ///
    /// Symlinks are never followed, so the walk stays inside the root.
    fn candidate_files(ctx: &ToolContext, pattern: &str, limit: usize) -> Result<Vec<PathBuf>, ToolError> {
        let matcher =
            glob::Pattern::new(pattern).map_err(|e| ToolError::InvalidArgument(format!("Invalid glob pattern: {}", e)))?;
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..Default::default()
        };

        Ok(WalkDir::new(ctx.root())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .strip_prefix(ctx.root())
                    .is_ok_and(|rel| matcher.matches_path_with(rel, options))
            })
            .take(limit)
            .map(|e| e.into_path())
            .collect())
    }
}

#[async_trait]
impl Tool for SearchFilesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "search_files",
            "Search for text inside files. Returns the matching lines with file and line number.",
        )
        .param(ParamSpec::required("text", ParamKind::Text, "Text to search for"))
        .param(ParamSpec::with_default(
            "pattern",
            ParamKind::Text,
            "Glob pattern of files to search",
            ParamValue::Text("**/*".into()),
        ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "SearchFilesTool::execute: called");
        let text = params.require_text("text")?;
        let pattern = params.text("pattern").unwrap_or_else(|| "**/*".into());
        let needle = text.to_lowercase();

        let files = Self::candidate_files(ctx, &pattern, ctx.limits.search_file_limit)?;
        debug!(count = files.len(), "SearchFilesTool::execute: candidate files");

        let mut hits = Vec::new();
        for file in files {
            // Binary or unreadable files are skipped
            let Ok(content) = tokio::fs::read_to_string(&file).await else {
                continue;
            };
            for (idx, line) in content.lines().enumerate() {
                if line.to_lowercase().contains(&needle) {
                    hits.push(SearchHit {
                        file: ctx.relative(&file),
                        line: idx + 1,
                        content: truncate_chars(line.trim(), MAX_LINE_CHARS, ""),
                    });
                }
            }
        }
        debug!(count = hits.len(), "SearchFilesTool::execute: hits found");

        if hits.is_empty() {
            return Ok("No matches found".to_string());
        }

        hits.truncate(ctx.limits.search_result_limit);
        Ok(serde_json::to_string_pretty(&hits)?)
    }
}
