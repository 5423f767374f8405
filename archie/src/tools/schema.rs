//! Tool descriptors - the declared parameter list of each tool

use serde::Serialize;

use super::params::ParamValue;

/// Type hint for a parameter, used in the prompt listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Text,
    Number,
    Bool,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Bool => write!(f, "bool"),
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<ParamValue>,
}

impl ParamSpec {
    /// A parameter the model must supply
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            required: true,
            default: None,
        }
    }

    /// A parameter that may be omitted and has no default
    pub fn optional(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// A parameter filled with `default` when omitted
    pub fn with_default(name: &str, kind: ParamKind, description: &str, default: ParamValue) -> Self {
        Self {
            required: false,
            default: Some(default),
            ..Self::required(name, kind, description)
        }
    }

    /// Missing this parameter fails validation
    pub fn is_mandatory(&self) -> bool {
        self.required && self.default.is_none()
    }
}

/// Name, description and ordered parameters of a tool
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            params: Vec::new(),
        }
    }

    /// Append a parameter (declaration order is validation order)
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Render the tool for the system prompt
    pub fn prompt_line(&self) -> String {
        let mut out = format!("- {}: {}", self.name, self.description);
        for p in &self.params {
            let mut line = format!("\n    {} ({}", p.name, p.kind);
            if p.is_mandatory() {
                line.push_str(", required");
            } else if let Some(default) = &p.default {
                line.push_str(&format!(", default {}", default));
            } else {
                line.push_str(", optional");
            }
            line.push_str(&format!("): {}", p.description));
            out.push_str(&line);
        }
        out
    }
}
