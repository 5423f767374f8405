//! Archie configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main Archie configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Chat model backend
    pub llm: LlmConfig,

    /// Sandbox roots
    pub sandbox: SandboxConfig,

    /// Orchestration loop limits
    pub agent: AgentConfig,

    /// Built-in tool limits
    pub tools: ToolsConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .archie.yml
        let local_config = PathBuf::from(".archie.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/archie/archie.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("archie").join("archie.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level so logging can be set up before the full load
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Apply the environment variables the assistant has always honoured
    ///
    /// `OLLAMA_BASE_URL`, `OLLAMA_MODEL`, `ARCHIE_BASE_DIR` and `EXTRA_READ_DIR`
    /// take precedence over file values. An empty `EXTRA_READ_DIR` disables
    /// the read-only root.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("OLLAMA_BASE_URL") {
            tracing::debug!(%url, "Config::apply_env_overrides: OLLAMA_BASE_URL");
            self.llm.base_url = url;
        }
        if let Some(model) = non_empty_env("OLLAMA_MODEL") {
            tracing::debug!(%model, "Config::apply_env_overrides: OLLAMA_MODEL");
            self.llm.model = model;
        }
        if let Some(root) = non_empty_env("ARCHIE_BASE_DIR") {
            tracing::debug!(%root, "Config::apply_env_overrides: ARCHIE_BASE_DIR");
            self.sandbox.root = PathBuf::from(root);
        }
        match std::env::var("EXTRA_READ_DIR") {
            Ok(dir) if dir.trim().is_empty() => self.sandbox.extra_read_dir = None,
            Ok(dir) => self.sandbox.extra_read_dir = Some(PathBuf::from(dir)),
            Err(_) => {}
        }
    }

    /// Validate configuration before use
    pub fn validate(&self) -> Result<()> {
        if self.llm.model.trim().is_empty() {
            return Err(eyre::eyre!("No model configured. Set llm.model or OLLAMA_MODEL."));
        }
        if self.llm.provider == "openai" && self.llm.api_key().is_none() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~/` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_prefix("~/")) {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| path.to_path_buf()),
        None => path.to_path_buf(),
    }
}

/// Chat model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("ollama" or "openai")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable containing the API key (openai only)
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        non_empty_env(&self.api_key_env)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "llama3.1".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            timeout_ms: 300_000,
        }
    }
}

/// Sandbox roots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Directory every path-based tool is confined to
    pub root: PathBuf,

    /// Optional directory exposed read-only
    #[serde(rename = "extra-read-dir")]
    pub extra_read_dir: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./sandbox"),
            extra_read_dir: None,
        }
    }
}

/// Orchestration loop limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Model calls allowed per user turn (None = unlimited)
    #[serde(rename = "max-iterations")]
    pub max_iterations: Option<u32>,
}

/// Limits enforced by the built-in tools themselves
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Base commands `run_command` accepts
    #[serde(rename = "allowed-commands")]
    pub allowed_commands: Vec<String>,

    /// run_command timeout in milliseconds
    #[serde(rename = "command-timeout-ms")]
    pub command_timeout_ms: u64,

    /// Bytes of stdout/stderr captured before the command fails
    #[serde(rename = "max-command-buffer")]
    pub max_command_buffer: usize,

    /// Characters of command output returned to the model
    #[serde(rename = "max-command-output")]
    pub max_command_output: usize,

    /// Characters of file content returned by `read_file`
    #[serde(rename = "max-read-chars")]
    pub max_read_chars: usize,

    /// Files scanned by `search_files`
    #[serde(rename = "search-file-limit")]
    pub search_file_limit: usize,

    /// Matches returned by `search_files`
    #[serde(rename = "search-result-limit")]
    pub search_result_limit: usize,

    /// Download timeout in milliseconds
    #[serde(rename = "download-timeout-ms")]
    pub download_timeout_ms: u64,

    /// Largest download accepted, in bytes
    #[serde(rename = "max-download-bytes")]
    pub max_download_bytes: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            allowed_commands: ["dir", "ls", "type", "cat", "find", "where", "echo", "curl", "wget"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            command_timeout_ms: 30_000,
            max_command_buffer: 1024 * 1024,
            max_command_output: 3000,
            max_read_chars: 5000,
            search_file_limit: 50,
            search_result_limit: 20,
            download_timeout_ms: 30_000,
            max_download_bytes: 100 * 1024 * 1024,
        }
    }
}
