//! ToolRegistry - the ordered set of tools the model can call

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::builtin::{
    CopyFromExtraTool, CreateFileTool, CreateFolderTool, DeleteFileTool, DownloadFileTool, FileInfoTool,
    ListExtraTool, ListFilesTool, MoveFileTool, ReadFileTool, RunCommandTool, SearchFilesTool,
};
use super::schema::ToolDescriptor;
use super::{Tool, ToolError};

struct Entry {
    descriptor: ToolDescriptor,
    tool: Arc<dyn Tool>,
}

/// Tools keyed by unique name, kept in registration order
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Registry with every built-in tool
    pub fn standard() -> Result<Self, ToolError> {
        debug!("ToolRegistry::standard: called");
        let mut registry = Self::empty();

        // Primary sandbox
        registry.register(Arc::new(ListFilesTool))?;
        registry.register(Arc::new(ReadFileTool))?;
        registry.register(Arc::new(SearchFilesTool))?;
        registry.register(Arc::new(MoveFileTool))?;
        registry.register(Arc::new(CreateFolderTool))?;
        registry.register(Arc::new(CreateFileTool))?;
        registry.register(Arc::new(DeleteFileTool))?;
        registry.register(Arc::new(FileInfoTool))?;

        // Read-only root
        registry.register(Arc::new(ListExtraTool))?;
        registry.register(Arc::new(CopyFromExtraTool))?;

        // Commands and network
        registry.register(Arc::new(RunCommandTool))?;
        registry.register(Arc::new(DownloadFileTool::new()))?;

        Ok(registry)
    }

    /// Create an empty registry (for testing)
    pub fn empty() -> Self {
        debug!("ToolRegistry::empty: called");
        Self::default()
    }

    /// Add a tool; a name can only be registered once
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let descriptor = tool.descriptor();
        debug!(tool_name = %descriptor.name, "ToolRegistry::register: called");
        if self.index.contains_key(&descriptor.name) {
            debug!("ToolRegistry::register: duplicate name");
            return Err(ToolError::DuplicateTool { name: descriptor.name });
        }
        self.index.insert(descriptor.name.clone(), self.entries.len());
        self.entries.push(Entry { descriptor, tool });
        Ok(())
    }

    /// Look up a tool and its descriptor by exact name
    pub fn get(&self, name: &str) -> Option<(&ToolDescriptor, Arc<dyn Tool>)> {
        self.index.get(name).map(|&i| {
            let entry = &self.entries[i];
            (&entry.descriptor, Arc::clone(&entry.tool))
        })
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.entries.iter().map(|e| &e.descriptor)
    }

    /// Tool listing for the system prompt
    pub fn prompt_listing(&self) -> String {
        self.descriptors()
            .map(ToolDescriptor::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check if a tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.descriptor.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
