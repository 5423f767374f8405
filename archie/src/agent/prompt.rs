//! System prompt documenting the tool protocol to the model

use std::path::Path;

use super::parser::ToolCall;
use crate::tools::ToolRegistry;

/// Build the system prompt for a registry and its roots
pub fn system_prompt(registry: &ToolRegistry, root: &Path, extra_dir: Option<&Path>) -> String {
    let extra = extra_dir
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not configured".to_string());

    let list_example = ToolCall::new("list_files")
        .param("directory", ".")
        .param("pattern", "*")
        .to_protocol();
    let create_example = ToolCall::new("create_file")
        .param("name", "notes.txt")
        .param("content", "This is the content of the file")
        .to_protocol();

    format!(
        "You are Archie, a helpful file assistant.

WORKING DIRECTORY: {root}
EXTRA DIRECTORY (read-only): {extra}

AVAILABLE TOOLS:
{tools}

INSTRUCTIONS:
1. To use a tool, reply EXACTLY like this:
[TOOL: tool_name]
param1: value1
param2: value2
[/TOOL]

2. Each parameter goes on its own line as `name: value`. For multi-line values,
   indent the continuation lines with a space.

3. Use ONE tool per reply. After each result you may call another tool if needed.

4. When ALL tasks are done, answer the user without using any tool.

5. If the user asks for several things, use the needed tools one at a time.

EXAMPLES:
- To list files:
{list_example}

- To create a file:
{create_example}

- To answer directly:
Hi! I'm Archie, your file assistant. How can I help?",
        root = root.display(),
        extra = extra,
        tools = registry.prompt_listing(),
        list_example = list_example,
        create_example = create_example,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::parser::parse_tool_call;

    #[test]
    fn test_prompt_mentions_roots_and_tools() {
        let registry = ToolRegistry::standard().unwrap();
        let prompt = system_prompt(&registry, Path::new("/srv/box"), None);

        assert!(prompt.contains("WORKING DIRECTORY: /srv/box"));
        assert!(prompt.contains("EXTRA DIRECTORY (read-only): not configured"));
        assert!(prompt.contains("- read_file:"));
        assert!(prompt.contains("- run_command:"));
    }

    #[test]
    fn test_prompt_example_parses() {
        let registry = ToolRegistry::standard().unwrap();
        let prompt = system_prompt(&registry, Path::new("/srv/box"), Some(Path::new("/home/u/Downloads")));

        assert!(prompt.contains("/home/u/Downloads"));
        // The first marker region in the prompt is the generic template
        let call = parse_tool_call(&prompt).unwrap();
        assert_eq!(call.name, "tool_name");
        assert_eq!(call.params.get("param1").map(String::as_str), Some("value1"));
    }
}
