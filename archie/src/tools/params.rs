//! Parameter coercion and validation
//!
//! Raw values arrive from the parser as strings. Validation runs first, in the
//! descriptor's declared order, and stops at the first missing mandatory
//! parameter. Coercion then turns `true`/`false` into booleans and numbers that
//! survive a round trip into numbers, and defaults are filled in last.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use super::ToolError;
use super::schema::ToolDescriptor;

/// A coerced parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Coerce a raw string from the protocol
    pub fn coerce(raw: &str) -> Self {
        match raw {
            "true" => return Self::Bool(true),
            "false" => return Self::Bool(false),
            _ => {}
        }
        // Only lossless numbers: "007", "1e3" and "1.50" stay text
        if let Ok(n) = raw.parse::<f64>()
            && n.is_finite()
            && n.to_string() == raw
        {
            return Self::Number(n);
        }
        Self::Text(raw.to_string())
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Validated, coerced parameters in the order they were supplied
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ToolParams {
    values: IndexMap<String, ParamValue>,
}

impl ToolParams {
    /// Validate raw values against a descriptor, coerce them and fill defaults
    pub fn prepare(descriptor: &ToolDescriptor, raw: &IndexMap<String, String>) -> Result<Self, ToolError> {
        debug!(tool = %descriptor.name, count = raw.len(), "ToolParams::prepare: called");

        for spec in &descriptor.params {
            let present = raw.get(&spec.name).is_some_and(|v| !v.trim().is_empty());
            if spec.is_mandatory() && !present {
                debug!(param = %spec.name, "ToolParams::prepare: missing required parameter");
                return Err(ToolError::MissingParameter {
                    name: spec.name.clone(),
                });
            }
        }

        let mut values: IndexMap<String, ParamValue> = raw
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.clone(), ParamValue::coerce(v)))
            .collect();

        for spec in &descriptor.params {
            if let Some(default) = &spec.default
                && !values.contains_key(&spec.name)
            {
                values.insert(spec.name.clone(), default.clone());
            }
        }

        Ok(Self { values })
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Value rendered as text, whatever it was coerced to
    pub fn text(&self, name: &str) -> Option<String> {
        self.values.get(name).map(|v| v.to_string())
    }

    /// Text value that must be present
    pub fn require_text(&self, name: &str) -> Result<String, ToolError> {
        self.text(name).ok_or_else(|| ToolError::MissingParameter { name: name.to_string() })
    }

    /// Boolean flag; absent or anything but `true` is false
    pub fn flag(&self, name: &str) -> bool {
        match self.values.get(name) {
            Some(ParamValue::Bool(b)) => *b,
            Some(ParamValue::Text(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Non-negative integer count
    pub fn count(&self, name: &str) -> Option<usize> {
        match self.values.get(name)? {
            ParamValue::Number(n) if *n >= 0.0 => Some(*n as usize),
            ParamValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }
}

impl FromIterator<(String, ParamValue)> for ToolParams {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::schema::{ParamKind, ParamSpec};

    fn raw(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new("delete_file", "Delete a file")
            .param(ParamSpec::required("path", ParamKind::Text, "Path"))
            .param(ParamSpec::required("confirm", ParamKind::Bool, "Confirm"))
            .param(ParamSpec::with_default(
                "limit",
                ParamKind::Number,
                "Limit",
                ParamValue::Number(20.0),
            ))
    }

    #[test]
    fn test_coerce_bool() {
        assert_eq!(ParamValue::coerce("true"), ParamValue::Bool(true));
        assert_eq!(ParamValue::coerce("false"), ParamValue::Bool(false));
        assert_eq!(ParamValue::coerce("True"), ParamValue::Text("True".into()));
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(ParamValue::coerce("42"), ParamValue::Number(42.0));
        assert_eq!(ParamValue::coerce("-3.5"), ParamValue::Number(-3.5));
        assert_eq!(ParamValue::coerce("007"), ParamValue::Text("007".into()));
        assert_eq!(ParamValue::coerce("1e3"), ParamValue::Text("1e3".into()));
        assert_eq!(ParamValue::coerce("NaN"), ParamValue::Text("NaN".into()));
        assert_eq!(ParamValue::coerce("inf"), ParamValue::Text("inf".into()));
    }

    #[test]
    fn test_missing_first_in_declared_order() {
        let err = ToolParams::prepare(&descriptor(), &raw(&[])).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { ref name } if name == "path"));

        let err = ToolParams::prepare(&descriptor(), &raw(&[("path", "a.txt")])).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { ref name } if name == "confirm"));
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let err = ToolParams::prepare(&descriptor(), &raw(&[("path", "   "), ("confirm", "true")])).unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { ref name } if name == "path"));
    }

    #[test]
    fn test_prepare_coerces_and_fills_defaults() {
        let params = ToolParams::prepare(&descriptor(), &raw(&[("path", "2024"), ("confirm", "true")])).unwrap();

        assert_eq!(params.get("path"), Some(&ParamValue::Number(2024.0)));
        assert_eq!(params.text("path").as_deref(), Some("2024"));
        assert!(params.flag("confirm"));
        assert_eq!(params.count("limit"), Some(20));
    }

    #[test]
    fn test_supplied_value_beats_default() {
        let params =
            ToolParams::prepare(&descriptor(), &raw(&[("path", "x"), ("confirm", "false"), ("limit", "5")])).unwrap();
        assert!(!params.flag("confirm"));
        assert_eq!(params.count("limit"), Some(5));
    }

    #[test]
    fn test_extra_params_pass_through() {
        let params =
            ToolParams::prepare(&descriptor(), &raw(&[("path", "x"), ("confirm", "true"), ("note", "hi")])).unwrap();
        assert_eq!(params.text("note").as_deref(), Some("hi"));
    }

    #[test]
    fn test_require_text_absent() {
        let params = ToolParams::default();
        assert!(params.require_text("path").is_err());
        assert!(!params.flag("confirm"));
        assert_eq!(params.count("limit"), None);
    }
}
