// ABOUTME: Variable binding sets used as render input
// ABOUTME: Provides name/path lookup plus the value formatting and truthiness rules

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::error::{Result, TemplateError};

/// A set of named values for one render pass.
///
/// Values are plain JSON: text, numbers, booleans, arrays (select/list
/// variables) and objects (context variables holding arbitrary data).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bindings {
    values: Map<String, JsonValue>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build bindings from plain string pairs, e.g. `key=value` CLI overrides
    pub fn from_strings(variables: &HashMap<String, String>) -> Self {
        variables
            .iter()
            .map(|(key, value)| (key.clone(), JsonValue::String(value.clone())))
            .collect()
    }

    /// Build bindings from a JSON object; `null` yields an empty set
    pub fn from_json(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(values) => Ok(Self { values }),
            JsonValue::Null => Ok(Self::default()),
            other => Err(TemplateError::InvalidBindings(format!(
                "expected an object of variables, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Add or replace a binding
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style variant of [`Bindings::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    /// Resolve a variable reference.
    ///
    /// An exact key wins; otherwise the name is treated as a dotted path into
    /// nested objects and arrays (`user.name`, `items.0`).
    pub fn lookup(&self, path: &str) -> Option<&JsonValue> {
        if let Some(value) = self.values.get(path) {
            return Some(value);
        }
        if !path.contains('.') {
            return None;
        }

        let mut segments = path.split('.');
        let mut current = self.values.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                JsonValue::Object(map) => map.get(segment)?,
                JsonValue::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    /// Overlay another set; its values win on conflict
    pub fn extend(&mut self, other: Bindings) {
        self.values.extend(other.values);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.values.clone())
    }
}

impl FromIterator<(String, JsonValue)> for Bindings {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl From<Map<String, JsonValue>> for Bindings {
    fn from(values: Map<String, JsonValue>) -> Self {
        Self { values }
    }
}

/// Render a value as prompt text. No escaping is ever applied.
pub fn format_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format_number(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items.iter().map(format_value).collect::<Vec<_>>().join(","),
        JsonValue::Object(_) => value.to_string(),
    }
}

/// Shortest decimal form; integral values print without a fraction.
/// Magnitudes from `1e21` up, or below `1e-6`, use exponent form (`1e+21`).
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        let exponent = format!("{:e}", n);
        match exponent.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => exponent,
        }
    } else {
        n.to_string()
    }
}

/// Convert a float result into a JSON value. Non-finite results have no JSON
/// number form and are kept as their textual rendering.
pub fn number_value(n: f64) -> JsonValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        JsonValue::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(format_number(n)))
    }
}

/// Truthiness used by `{{#if}}`
pub fn is_truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Array(items)) => !items.is_empty(),
        Some(JsonValue::Object(_)) => true,
    }
}

/// Defined and not null, used by `ifExists`
pub fn is_present(value: Option<&JsonValue>) -> bool {
    !matches!(value, None | Some(JsonValue::Null))
}

/// Present and not an empty string, array or object, used by `ifNotEmpty`
pub fn is_not_empty(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Array(items)) => !items.is_empty(),
        Some(JsonValue::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

pub(crate) fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_prefers_exact_key() {
        let bindings = Bindings::from_json(json!({
            "user.name": "flat",
            "user": { "name": "nested" }
        }))
        .unwrap();

        assert_eq!(bindings.lookup("user.name"), Some(&json!("flat")));
    }

    #[test]
    fn test_lookup_walks_nested_values() {
        let bindings = Bindings::from_json(json!({
            "customer": { "name": "Ada", "tags": ["vip", "beta"] }
        }))
        .unwrap();

        assert_eq!(bindings.lookup("customer.name"), Some(&json!("Ada")));
        assert_eq!(bindings.lookup("customer.tags.1"), Some(&json!("beta")));
        assert_eq!(bindings.lookup("customer.tags.7"), None);
        assert_eq!(bindings.lookup("customer.email"), None);
        assert_eq!(bindings.lookup("missing"), None);
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Bindings::from_json(json!(null)).unwrap().is_empty());
        assert!(matches!(
            Bindings::from_json(json!([1, 2])),
            Err(TemplateError::InvalidBindings(_))
        ));
    }

    #[test]
    fn test_from_strings() {
        let mut variables = HashMap::new();
        variables.insert("tone".to_string(), "friendly".to_string());

        let bindings = Bindings::from_strings(&variables);
        assert_eq!(bindings.get("tone"), Some(&json!("friendly")));
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!(null)), "");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(2.5)), "2.5");
        assert_eq!(format_value(&json!(5.0)), "5");
        assert_eq!(format_value(&json!(["a", 1, true])), "a,1,true");
        assert_eq!(format_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
        assert_eq!(format_value(&json!("<b>&</b>")), "<b>&</b>");
    }

    #[test]
    fn test_format_number_special_values() {
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn test_format_number_exponent_range() {
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(0.000001), "0.000001");
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(None));
        assert!(!is_truthy(Some(&json!(false))));
        assert!(!is_truthy(Some(&json!(0))));
        assert!(!is_truthy(Some(&json!(0.0))));
        assert!(!is_truthy(Some(&json!(""))));
        assert!(!is_truthy(Some(&json!([]))));
        assert!(is_truthy(Some(&json!({}))));
        assert!(is_truthy(Some(&json!("no"))));
        assert!(is_truthy(Some(&json!(-1))));
    }

    #[test]
    fn test_presence_and_emptiness() {
        assert!(is_present(Some(&json!(""))));
        assert!(!is_present(Some(&json!(null))));
        assert!(!is_not_empty(Some(&json!(""))));
        assert!(!is_not_empty(Some(&json!({}))));
        assert!(is_not_empty(Some(&json!(0))));
    }
}
