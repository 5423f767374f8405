//! Tool error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during tool registration, validation or execution
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Access denied: {path} is outside {root}")]
    AccessDenied { path: PathBuf, root: PathBuf },

    #[error("Required parameter \"{name}\" not provided or empty")]
    MissingParameter { name: String },

    #[error("Tool \"{name}\" not found")]
    UnknownTool { name: String },

    #[error("Tool \"{name}\" is already registered")]
    DuplicateTool { name: String },

    #[error("Command \"{command}\" is not allowed. Allowed commands: {allowed}")]
    CommandNotAllowed { command: String, allowed: String },

    #[error("Command timed out after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },

    #[error("Command exited with status {code}: {output}")]
    CommandFailed { code: i32, output: String },

    #[error("Command output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("No extra read directory is configured")]
    NoExtraDir,

    #[error("Not found: {path}")]
    NotFound { path: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tool panicked: {0}")]
    Panicked(String),
}
