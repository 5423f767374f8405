//! Tool-call parser for the textual marker protocol
//!
//! The model asks for a tool by writing a region like:
//!
//! ```text
//! [TOOL: create_file]
//! name: notes.txt
//! content: first line
//!   second line
//! [/TOOL]
//! ```
//!
//! Markers are case-insensitive and only the first region counts. Inside the
//! region, a line that does not start with a space or tab and has a colon
//! after at least one character starts a new `key: value` pair; any other
//! line continues the current value. Values are trimmed, and a value that
//! trims to nothing is treated as absent.

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static TOOL_REGION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\[TOOL:\s*([A-Za-z0-9_]+)\](.*?)\[/TOOL\]").expect("tool region regex is valid")
});

/// A tool request extracted from model output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub params: IndexMap<String, String>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: IndexMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Render back into the marker protocol
    pub fn to_protocol(&self) -> String {
        let mut out = format!("[TOOL: {}]\n", self.name);
        for (key, value) in &self.params {
            out.push_str(&format!("{}: {}\n", key, value));
        }
        out.push_str("[/TOOL]");
        out
    }
}

/// One line of a region body
#[derive(Debug, PartialEq, Eq)]
enum BodyLine<'a> {
    Key { key: &'a str, value: &'a str },
    Continuation(&'a str),
}

impl<'a> BodyLine<'a> {
    fn classify(line: &'a str) -> Self {
        let indented = line.starts_with(' ') || line.starts_with('\t');
        match line.find(':') {
            Some(idx) if idx > 0 && !indented => BodyLine::Key {
                key: line[..idx].trim(),
                value: &line[idx + 1..],
            },
            _ => BodyLine::Continuation(line),
        }
    }
}

/// Accumulates `key: value` pairs across continuation lines
#[derive(Default)]
struct BodyReader {
    params: IndexMap<String, String>,
    current: Option<(String, String)>,
}

impl BodyReader {
    fn feed(&mut self, line: BodyLine<'_>) {
        match line {
            BodyLine::Key { key, value } => {
                self.flush();
                self.current = Some((key.to_string(), value.to_string()));
            }
            BodyLine::Continuation(text) => {
                // Text before the first key is ignored
                if let Some((_, value)) = self.current.as_mut() {
                    value.push('\n');
                    value.push_str(text);
                }
            }
        }
    }

    fn flush(&mut self) {
        if let Some((key, value)) = self.current.take() {
            let value = value.trim();
            if !value.is_empty() {
                self.params.insert(key, value.to_string());
            }
        }
    }

    fn finish(mut self) -> IndexMap<String, String> {
        self.flush();
        self.params
    }
}

/// Extract the first tool call from model output, if any
pub fn parse_tool_call(text: &str) -> Option<ToolCall> {
    let captures = TOOL_REGION.captures(text)?;
    let name = captures.get(1)?.as_str().to_string();
    let body = captures.get(2).map(|m| m.as_str().trim()).unwrap_or_default();

    let mut reader = BodyReader::default();
    for line in body.lines() {
        reader.feed(BodyLine::classify(line));
    }
    let params = reader.finish();
    debug!(%name, param_count = params.len(), "parse_tool_call: found tool call");

    Some(ToolCall { name, params })
}
