//! CLI definitions

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// Archie - conversational file assistant
#[derive(Debug, Parser)]
#[command(
    name = "archie",
    about = "Conversational file assistant that works inside a sandboxed folder",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(short = 'l', long = "log-level", help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)")]
    pub log_level: Option<String>,

    /// Sandbox root (overrides config and ARCHIE_BASE_DIR)
    #[arg(short, long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Read-only extra directory (overrides config and EXTRA_READ_DIR)
    #[arg(short, long = "extra-dir", value_name = "DIR")]
    pub extra_dir: Option<PathBuf>,

    /// Model name (overrides config and OLLAMA_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum model calls per request
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Output format for one-shot mode
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Run this request once and exit instead of starting the REPL
    #[arg(trailing_var_arg = true, value_name = "PROMPT")]
    pub prompt: Vec<String>,
}

impl Cli {
    /// The one-shot request, if any words were given
    pub fn prompt(&self) -> Option<String> {
        let prompt = self.prompt.join(" ");
        let prompt = prompt.trim();
        if prompt.is_empty() { None } else { Some(prompt.to_string()) }
    }

    /// Apply flag overrides on top of file and environment values
    pub fn apply_to(&self, config: &mut Config) {
        debug!(root = ?self.root, extra_dir = ?self.extra_dir, model = ?self.model, "Cli::apply_to: called");
        if let Some(root) = &self.root {
            config.sandbox.root = root.clone();
        }
        if let Some(extra) = &self.extra_dir {
            config.sandbox.extra_read_dir = Some(extra.clone());
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = Some(max);
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("archie")
        .join("logs")
        .join("archie.log")
}

/// Generate the after_help text with environment and log locations
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let mut help = String::new();

    help.push_str("Environment:\n");
    for (name, purpose) in [
        ("OLLAMA_BASE_URL", "model server URL"),
        ("OLLAMA_MODEL", "model name"),
        ("ARCHIE_BASE_DIR", "sandbox root"),
        ("EXTRA_READ_DIR", "read-only extra directory"),
    ] {
        let value = std::env::var(name).unwrap_or_else(|_| "(unset)".to_string());
        help.push_str(&format!("  {:<16} {:<26} {}\n", name, purpose, value));
    }

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}

/// Output format for one-shot mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
