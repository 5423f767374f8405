//! Line-oriented rendering of agent events

use colored::Colorize;
use indexmap::IndexMap;

use crate::agent::AgentEvent;

/// Tool results at least this long are not previewed
const PREVIEW_MAX_CHARS: usize = 800;
const PREVIEW_MAX_LINES: usize = 8;
const PARAM_MAX_CHARS: usize = 20;

/// Render one event as the text to print
pub fn render_event(event: &AgentEvent) -> String {
    match event {
        AgentEvent::Thinking { message } => format!("{} {}", "[...]".dimmed(), message.dimmed()),
        AgentEvent::ToolStart { tool, params } => {
            format!("{} {}{}", "[TOOL]".magenta(), tool.magenta(), render_params(params).dimmed())
        }
        AgentEvent::ToolEnd {
            tool,
            result,
            success,
            duration_ms,
        } => {
            let status = if *success {
                "[OK]".green()
            } else {
                "[X]".red()
            };
            let mut out = format!(
                "{} {} {}",
                tool.magenta(),
                status,
                format!("({}ms)", duration_ms).dimmed()
            );
            if result.chars().count() < PREVIEW_MAX_CHARS {
                out.push('\n');
                out.push_str(&render_preview(result));
            }
            out
        }
        AgentEvent::Response { content } => {
            let body: Vec<String> = content.lines().map(|line| format!("  {}", line)).collect();
            format!("\n{}\n{}\n", "Archie:".bright_green(), body.join("\n"))
        }
        AgentEvent::Error { message } => format!("\n{} {}\n", "[ERR]".red(), message.red()),
    }
}

/// `(key=value, ...)` with long values shortened
fn render_params(params: &IndexMap<String, String>) -> String {
    if params.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = params
        .iter()
        .map(|(key, value)| {
            let short = if value.chars().count() > PARAM_MAX_CHARS {
                format!("{}...", value.chars().take(PARAM_MAX_CHARS).collect::<String>())
            } else {
                value.clone()
            };
            format!("{}={}", key, short)
        })
        .collect();
    format!(" ({})", parts.join(", "))
}

/// Gutter-prefixed first lines of a tool result
fn render_preview(result: &str) -> String {
    let lines: Vec<&str> = result.lines().collect();
    let mut out = vec![format!("{}", "  |".dimmed())];
    for line in lines.iter().take(PREVIEW_MAX_LINES) {
        out.push(format!("{} {}", "  |".dimmed(), line));
    }
    if lines.len() > PREVIEW_MAX_LINES {
        out.push(format!(
            "{}",
            format!("  | ... +{} more lines", lines.len() - PREVIEW_MAX_LINES).dimmed()
        ));
    }
    out.push(format!("{}", "  |".dimmed()));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(event: &AgentEvent) -> String {
        colored::control::set_override(false);
        render_event(event)
    }

    #[test]
    fn test_tool_start_shortens_params() {
        let mut params = IndexMap::new();
        params.insert("name".to_string(), "notes.txt".to_string());
        params.insert("content".to_string(), "a".repeat(30));

        let out = plain(&AgentEvent::ToolStart {
            tool: "create_file".into(),
            params,
        });
        assert_eq!(
            out,
            format!("[TOOL] create_file (name=notes.txt, content={}...)", "a".repeat(20))
        );
    }

    #[test]
    fn test_tool_end_preview_is_capped() {
        let result = (1..=10).map(|i| format!("line {}", i)).collect::<Vec<_>>().join("\n");
        let out = plain(&AgentEvent::ToolEnd {
            tool: "read_file".into(),
            result,
            success: true,
            duration_ms: 3,
        });

        assert!(out.starts_with("read_file [OK] (3ms)"));
        assert!(out.contains("  | line 8"));
        assert!(!out.contains("line 9"));
        assert!(out.contains("... +2 more lines"));
    }

    #[test]
    fn test_long_result_not_previewed() {
        let out = plain(&AgentEvent::ToolEnd {
            tool: "read_file".into(),
            result: "x".repeat(900),
            success: false,
            duration_ms: 1,
        });
        assert_eq!(out, "read_file [X] (1ms)");
    }

    #[test]
    fn test_response_and_error() {
        let out = plain(&AgentEvent::Response {
            content: "one\ntwo".into(),
        });
        assert_eq!(out, "\nArchie:\n  one\n  two\n");

        let out = plain(&AgentEvent::Error { message: "boom".into() });
        assert_eq!(out, "\n[ERR] boom\n");
    }
}
