// ABOUTME: Typed variable definitions declared by prompt documents
// ABOUTME: Checks and normalizes binding values against their declared kind

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use crate::template::context::{format_value, json_type_name, number_value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    #[default]
    Text,
    Number,
    Boolean,
    /// One or more values from a fixed option list
    Select,
    /// Arbitrary structured data
    Context,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Text => "text",
            VariableKind::Number => "number",
            VariableKind::Boolean => "boolean",
            VariableKind::Select => "select",
            VariableKind::Context => "context",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: VariableKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl VariableDefinition {
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            required: false,
            default: None,
            example: None,
            options: Vec::new(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<JsonValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_example(mut self, value: impl Into<JsonValue>) -> Self {
        self.example = Some(value.into());
        self
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Value used when previewing the template: the example, else the default
    pub fn preview_value(&self) -> Option<&JsonValue> {
        self.example.as_ref().or(self.default.as_ref())
    }

    /// Check a value against the declared kind, returning it normalized.
    ///
    /// Text values from the command line arrive as strings, so numbers and
    /// booleans are parsed from their textual form. Null is always accepted.
    pub fn coerce(&self, value: &JsonValue) -> std::result::Result<JsonValue, String> {
        match (self.kind, value) {
            (_, JsonValue::Null) | (VariableKind::Context, _) => Ok(value.clone()),

            (VariableKind::Text, JsonValue::String(_)) => Ok(value.clone()),
            (VariableKind::Text, JsonValue::Number(_) | JsonValue::Bool(_)) => {
                Ok(JsonValue::String(format_value(value)))
            }

            (VariableKind::Number, JsonValue::Number(_)) => Ok(value.clone()),
            (VariableKind::Number, JsonValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(number_value)
                .ok_or_else(|| format!("expected a number, found '{}'", s)),

            (VariableKind::Boolean, JsonValue::Bool(_)) => Ok(value.clone()),
            (VariableKind::Boolean, JsonValue::String(s)) => match s.trim() {
                "true" => Ok(JsonValue::Bool(true)),
                "false" => Ok(JsonValue::Bool(false)),
                _ => Err(format!("expected true or false, found '{}'", s)),
            },

            (VariableKind::Select, JsonValue::String(s)) => {
                self.check_option(s)?;
                Ok(value.clone())
            }
            (VariableKind::Select, JsonValue::Array(items)) => {
                for item in items {
                    let choice = item.as_str().ok_or_else(|| {
                        format!("select values must be strings, found {}", json_type_name(item))
                    })?;
                    self.check_option(choice)?;
                }
                Ok(value.clone())
            }

            (kind, other) => Err(format!(
                "expected a {} value, found {}",
                kind,
                json_type_name(other)
            )),
        }
    }

    fn check_option(&self, choice: &str) -> std::result::Result<(), String> {
        if self.options.is_empty() || self.options.iter().any(|o| o == choice) {
            Ok(())
        } else {
            Err(format!(
                "'{}' is not one of the options: {}",
                choice,
                self.options.join(", ")
            ))
        }
    }
}
