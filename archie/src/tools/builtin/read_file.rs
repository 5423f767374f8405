//! read_file tool - read a text file from the sandbox

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncReadExt;
use tracing::debug;

use super::truncate_chars;
use crate::tools::{ParamKind, ParamSpec, Tool, ToolContext, ToolDescriptor, ToolError, ToolParams};

/// Read the content of a text file
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("read_file", "Read the content of a text file")
            .param(ParamSpec::required("path", ParamKind::Text, "Path of the file to read"))
    }

    async fn execute(&self, params: &ToolParams, ctx: &ToolContext) -> Result<String, ToolError> {
        debug!(?params, "ReadFileTool::execute: called");
        let path = ctx.resolve(&params.require_text("path")?)?;

        // A char is at most 4 bytes; one spare char guarantees the marker on cut files
        let max_chars = ctx.limits.max_read_chars;
        let byte_cap = max_chars.saturating_add(1).saturating_mul(4) as u64;
        let mut bytes = Vec::new();
        tokio::fs::File::open(&path)
            .await?
            .take(byte_cap)
            .read_to_end(&mut bytes)
            .await?;
        let clipped = bytes.len() as u64 == byte_cap;
        let content = decode_prefix(bytes, clipped)?;
        debug!(len = content.len(), clipped, "ReadFileTool::execute: file read");

        Ok(truncate_chars(&content, max_chars, "\n... [content truncated]"))
    }
}

/// Decode UTF-8, dropping a character split by the read cap
fn decode_prefix(bytes: Vec<u8>, clipped: bool) -> Result<String, ToolError> {
    let invalid = || io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8");
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) if clipped && e.utf8_error().error_len().is_none() => {
            let valid = e.utf8_error().valid_up_to();
            let mut bytes = e.into_bytes();
            bytes.truncate(valid);
            String::from_utf8(bytes).map_err(|_| invalid().into())
        }
        Err(_) => Err(invalid().into()),
    }
}
