//! download_file tool - fetch a URL into the sandbox

use async_trait::async_trait;
use futures::StreamExt;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::kb;
use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

const DEFAULT_NAME: &str = "download";

/// Download a file over http(s) into the working directory
pub struct DownloadFileTool {
    user_agent: String,
}

impl DownloadFileTool {
    pub fn new() -> Self {
        debug!("DownloadFileTool::new: called");
        Self {
            user_agent: format!("archie/{} (download tool)", env!("CARGO_PKG_VERSION")),
        }
    }

    /// File name taken from the last URL path segment
    fn name_from_url(url: &reqwest::Url) -> String {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_NAME)
            .to_string()
    }
}

impl Default for DownloadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DownloadFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("download_file", "Download a file from a URL into the working directory")
            .param(ParamSpec::required("url", ParamKind::Text, "http or https URL of the file"))
            .param(ParamSpec::optional(
                "name",
                ParamKind::Text,
                "File name to save as (taken from the URL when omitted)",
            ))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "DownloadFileTool::execute: called");
        let raw_url = params.require_text("url")?;
        let url = reqwest::Url::parse(raw_url.trim())
            .map_err(|e| ToolError::InvalidArgument(format!("Invalid URL {}: {}", raw_url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ToolError::InvalidArgument("URL must start with http:// or https://".into()));
        }

        let name = params.text("name").unwrap_or_else(|| Self::name_from_url(&url));
        let dest = ctx.resolve(&name)?;
        if dest == ctx.root() {
            return Err(ToolError::InvalidArgument("A file name is required".into()));
        }
        let limit = ctx.limits.max_download_bytes;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(ctx.limits.download_timeout_ms))
            .user_agent(&self.user_agent)
            .build()?;

        debug!(%url, "DownloadFileTool::execute: sending HTTP request");
        let response = client.get(url).send().await?.error_for_status()?;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(ToolError::InvalidArgument(format!("File is larger than {} bytes", limit)));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(ToolError::InvalidArgument(format!("File is larger than {} bytes", limit)));
            }
            body.extend_from_slice(&chunk);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&dest).await?;
        file.write_all(&body).await?;
        file.flush().await?;
        debug!(?dest, size = body.len(), "DownloadFileTool::execute: saved");

        Ok(format!("Downloaded: {} ({})", ctx.relative(&dest), kb(body.len() as u64)))
    }
}
