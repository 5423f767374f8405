//! Path sandbox - confines tool path arguments to a root directory
//!
//! Every path a tool receives from the model goes through [`Sandbox::resolve`].
//! The input is joined onto the root, `.` and `..` are folded lexically, and
//! the longest prefix that exists on disk is canonicalized so symlinks cannot
//! point outside. Whatever does not exist yet is re-appended unchanged. The
//! result is accepted only if it is the root or lies beneath it.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ToolError;

/// Read-write sandbox rooted at a canonical directory
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create a sandbox; the root must exist
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        let root = root.as_ref();
        debug!(?root, "Sandbox::new: called");
        let root = root.canonicalize()?;
        Ok(Self { root })
    }

    /// Canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a tool-supplied path to an absolute path inside the root
    pub fn resolve(&self, input: &str) -> Result<PathBuf, ToolError> {
        debug!(%input, "Sandbox::resolve: called");
        let input = input.trim();
        if input.is_empty() {
            return Ok(self.root.clone());
        }

        let joined = normalize(&self.root.join(input));
        let resolved = resolve_existing_prefix(&joined).ok_or_else(|| self.denied(input))?;

        if resolved.starts_with(&self.root) {
            debug!(?resolved, "Sandbox::resolve: inside root");
            Ok(resolved)
        } else {
            debug!(?resolved, "Sandbox::resolve: outside root");
            Err(self.denied(input))
        }
    }

    /// Resolve a path naming a directory entry itself, without following it
    ///
    /// The parent goes through [`Sandbox::resolve`]; the final name is kept
    /// as-is so a symlink resolves to the link, not its target.
    pub fn resolve_entry(&self, input: &str) -> Result<PathBuf, ToolError> {
        debug!(%input, "Sandbox::resolve_entry: called");
        let lexical = normalize(&self.root.join(input.trim()));
        if lexical == self.root || !lexical.starts_with(&self.root) {
            return self.resolve(input);
        }
        let Some(name) = lexical.file_name().map(|n| n.to_os_string()) else {
            return self.resolve(input);
        };
        let Some(parent) = lexical.parent() else {
            return self.resolve(input);
        };

        let parent = self.resolve(&parent.to_string_lossy())?;
        let entry = parent.join(name);
        if entry.starts_with(&self.root) {
            Ok(entry)
        } else {
            Err(self.denied(input))
        }
    }

    /// Path relative to the root, for display
    pub fn relative(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }

    fn denied(&self, input: &str) -> ToolError {
        ToolError::AccessDenied {
            path: PathBuf::from(input),
            root: self.root.clone(),
        }
    }
}

/// Secondary root that only exposes read access
///
/// Handlers that copy out of it must write through the primary [`Sandbox`].
#[derive(Debug, Clone)]
pub struct ReadOnlyRoot {
    inner: Sandbox,
}

impl ReadOnlyRoot {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, ToolError> {
        Ok(Self {
            inner: Sandbox::new(root)?,
        })
    }

    pub fn root(&self) -> &Path {
        self.inner.root()
    }

    /// Resolve a path for reading; same containment rules as the sandbox
    pub fn resolve_read(&self, input: &str) -> Result<PathBuf, ToolError> {
        self.inner.resolve(input)
    }
}

/// Fold `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the longest prefix present on disk and re-append the rest
///
/// A dangling symlink in the prefix cannot be canonicalized and yields `None`.
fn resolve_existing_prefix(path: &Path) -> Option<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();

    while existing.symlink_metadata().is_err() {
        let name = existing.file_name()?.to_os_string();
        tail.push(name);
        if !existing.pop() {
            return None;
        }
    }

    let mut resolved = existing.canonicalize().ok()?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Some(resolved)
}
