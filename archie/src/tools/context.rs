//! ToolContext - execution context shared by every tool call

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{SandboxConfig, ToolsConfig, expand_home};

use super::ToolError;
use super::sandbox::{ReadOnlyRoot, Sandbox};

/// Execution context for tools
///
/// Holds the primary sandbox every path argument is resolved through, the
/// optional read-only root, and the limits the handlers enforce themselves.
#[derive(Debug, Clone)]
pub struct ToolContext {
    sandbox: Sandbox,
    extra: Option<ReadOnlyRoot>,
    pub limits: ToolsConfig,
}

impl ToolContext {
    /// Create a context over an existing root
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        debug!(root = ?root.as_ref(), "ToolContext::new: called");
        Ok(Self {
            sandbox: Sandbox::new(root)?,
            extra: None,
            limits: ToolsConfig::default(),
        })
    }

    /// Build from configuration; both roots must already exist
    pub fn from_config(sandbox: &SandboxConfig, limits: &ToolsConfig) -> Result<Self, ToolError> {
        debug!(?sandbox, "ToolContext::from_config: called");
        let root = expand_home(&sandbox.root);
        let mut ctx = Self::new(root)?.with_limits(limits.clone());
        if let Some(extra) = &sandbox.extra_read_dir {
            ctx = ctx.with_extra_dir(expand_home(extra))?;
        }
        Ok(ctx)
    }

    /// Attach a read-only secondary root
    pub fn with_extra_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, ToolError> {
        debug!(dir = ?dir.as_ref(), "ToolContext::with_extra_dir: called");
        self.extra = Some(ReadOnlyRoot::new(dir)?);
        Ok(self)
    }

    pub fn with_limits(mut self, limits: ToolsConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    /// Resolve a path argument through the primary sandbox
    pub fn resolve(&self, input: &str) -> Result<PathBuf, ToolError> {
        self.sandbox.resolve(input)
    }

    /// Resolve a path argument that names the entry itself, symlinks included
    pub fn resolve_entry(&self, input: &str) -> Result<PathBuf, ToolError> {
        self.sandbox.resolve_entry(input)
    }

    /// Path relative to the sandbox root, for messages
    pub fn relative(&self, path: &Path) -> String {
        self.sandbox.relative(path)
    }

    /// The read-only root, or `NoExtraDir`
    pub fn extra_dir(&self) -> Result<&ReadOnlyRoot, ToolError> {
        self.extra.as_ref().ok_or(ToolError::NoExtraDir)
    }

    pub fn has_extra_dir(&self) -> bool {
        self.extra.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_context_resolves_inside_root() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        let resolved = ctx.resolve("notes/todo.txt").unwrap();
        assert!(resolved.starts_with(ctx.root()));
        assert!(ctx.resolve("../outside").is_err());
    }

    #[test]
    fn test_extra_dir_absent() {
        let temp = tempdir().unwrap();
        let ctx = ToolContext::new(temp.path()).unwrap();

        assert!(!ctx.has_extra_dir());
        assert!(matches!(ctx.extra_dir(), Err(ToolError::NoExtraDir)));
    }

    #[test]
    fn test_from_config() {
        let root = tempdir().unwrap();
        let extra = tempdir().unwrap();
        let sandbox = SandboxConfig {
            root: root.path().to_path_buf(),
            extra_read_dir: Some(extra.path().to_path_buf()),
        };
        let limits = ToolsConfig {
            max_read_chars: 10,
            ..Default::default()
        };

        let ctx = ToolContext::from_config(&sandbox, &limits).unwrap();
        assert!(ctx.has_extra_dir());
        assert_eq!(ctx.limits.max_read_chars, 10);
    }
}
