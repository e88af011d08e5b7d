// ABOUTME: Built-in helper functions applied inside placeholders
// ABOUTME: Fixed name-to-function registry plus an injectable clock for datetime

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::context::{format_value, is_not_empty, number_value};
use super::error::RenderError;

static NULL: JsonValue = JsonValue::Null;

/// Source of wall-clock time for the `datetime` helper
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A resolved helper argument
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// Value found in the bindings
    Bound(JsonValue),
    /// Quoted literal from the template text
    Literal(JsonValue),
    /// Bare word with no binding, used as a literal
    Unbound(JsonValue),
}

impl Param {
    pub fn value(&self) -> &JsonValue {
        match self {
            Param::Bound(v) | Param::Literal(v) | Param::Unbound(v) => v,
        }
    }

    /// The value when it names something that exists; unbound words do not
    pub fn existing(&self) -> Option<&JsonValue> {
        match self {
            Param::Bound(v) | Param::Literal(v) => Some(v),
            Param::Unbound(_) => None,
        }
    }
}

/// Arguments for a single helper invocation
pub struct HelperCall<'a> {
    pub name: &'a str,
    pub params: &'a [Param],
    pub clock: &'a dyn Clock,
}

impl<'a> HelperCall<'a> {
    pub fn param(&self, index: usize) -> Option<&JsonValue> {
        self.params.get(index).map(Param::value)
    }

    /// The first argument, or null when absent
    pub fn value(&self) -> &JsonValue {
        self.param(0).unwrap_or(&NULL)
    }

    pub fn fail(&self, reason: impl Into<String>) -> RenderError {
        RenderError::Helper {
            helper: self.name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type HelperResult = std::result::Result<JsonValue, RenderError>;
pub type HelperFn = fn(&HelperCall<'_>) -> HelperResult;

/// Immutable table of helpers, built once per engine
pub struct HelperRegistry {
    helpers: HashMap<&'static str, HelperFn>,
    clock: Arc<dyn Clock>,
}

impl HelperRegistry {
    /// Registry with all built-in helpers and the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut helpers: HashMap<&'static str, HelperFn> = HashMap::new();
        helpers.insert("uppercase", uppercase_helper);
        helpers.insert("lowercase", lowercase_helper);
        helpers.insert("titlecase", titlecase_helper);
        helpers.insert("ifExists", if_exists_helper);
        helpers.insert("ifNotEmpty", if_not_empty_helper);
        helpers.insert("truncate", truncate_helper);
        helpers.insert("datetime", datetime_helper);
        helpers.insert("join", join_helper);
        helpers.insert("count", count_helper);
        helpers.insert("math", math_helper);

        Self { helpers, clock }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registered helper names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.helpers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Invoke a helper by exact name
    pub fn call(&self, name: &str, params: &[Param]) -> HelperResult {
        let helper = self.helpers.get(name).ok_or_else(|| RenderError::Helper {
            helper: name.to_string(),
            reason: "unknown helper".to_string(),
        })?;

        helper(&HelperCall {
            name,
            params,
            clock: self.clock.as_ref(),
        })
    }
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.names())
            .field("clock", &self.clock)
            .finish()
    }
}

/// Uppercase helper
fn uppercase_helper(call: &HelperCall<'_>) -> HelperResult {
    Ok(map_string(call.value(), str::to_uppercase))
}

/// Lowercase helper
fn lowercase_helper(call: &HelperCall<'_>) -> HelperResult {
    Ok(map_string(call.value(), str::to_lowercase))
}

/// Titlecase helper - capitalizes the first letter of each word
fn titlecase_helper(call: &HelperCall<'_>) -> HelperResult {
    Ok(map_string(call.value(), titlecase))
}

fn if_exists_helper(call: &HelperCall<'_>) -> HelperResult {
    let exists = call
        .params
        .first()
        .and_then(Param::existing)
        .map(|v| !v.is_null())
        .unwrap_or(false);
    Ok(JsonValue::Bool(exists))
}

fn if_not_empty_helper(call: &HelperCall<'_>) -> HelperResult {
    let existing = call.params.first().and_then(Param::existing);
    Ok(JsonValue::Bool(is_not_empty(existing)))
}

/// Truncate helper - clips to `length` characters including the ending
fn truncate_helper(call: &HelperCall<'_>) -> HelperResult {
    let JsonValue::String(text) = call.value() else {
        return Ok(call.value().clone());
    };

    let length = call.param(1).and_then(as_length).unwrap_or(100);
    let ending = call
        .param(2)
        .map(format_value)
        .unwrap_or_else(|| "...".to_string());

    if text.chars().count() <= length {
        return Ok(JsonValue::String(text.clone()));
    }

    let keep = length.saturating_sub(ending.chars().count());
    let mut clipped: String = text.chars().take(keep).collect();
    clipped.push_str(&ending);
    Ok(JsonValue::String(clipped))
}

/// Datetime helper - formats the current time
fn datetime_helper(call: &HelperCall<'_>) -> HelperResult {
    let format = call.param(0).and_then(JsonValue::as_str).unwrap_or("full");
    let now = call.clock.now();

    let formatted = match format {
        "date" => now.format("%Y-%m-%d").to_string(),
        "time" => now.format("%H:%M:%S").to_string(),
        "iso" => now.to_rfc3339_opts(SecondsFormat::Millis, true),
        _ => now.format("%A, %B %-d, %Y %H:%M:%S").to_string(),
    };
    Ok(JsonValue::String(formatted))
}

/// Join helper - joins array elements with a separator
fn join_helper(call: &HelperCall<'_>) -> HelperResult {
    let JsonValue::Array(items) = call.value() else {
        return Ok(call.value().clone());
    };

    let separator = call
        .param(1)
        .map(format_value)
        .unwrap_or_else(|| ", ".to_string());
    let joined = items
        .iter()
        .map(format_value)
        .collect::<Vec<_>>()
        .join(&separator);
    Ok(JsonValue::String(joined))
}

fn count_helper(call: &HelperCall<'_>) -> HelperResult {
    let count = match call.value() {
        JsonValue::Array(items) => items.len(),
        _ => 0,
    };
    Ok(JsonValue::from(count))
}

/// Math helper - `{{math lvalue "op" rvalue}}`
fn math_helper(call: &HelperCall<'_>) -> HelperResult {
    let left = as_float(call.value());
    let right = call.param(2).map(as_float).unwrap_or(f64::NAN);
    let operator = call.param(1).map(format_value).unwrap_or_default();

    let result = match operator.as_str() {
        "+" => left + right,
        "-" => left - right,
        "*" => left * right,
        "/" => left / right,
        "%" => left % right,
        other => return Err(call.fail(format!("unsupported operator '{}'", other))),
    };
    Ok(number_value(result))
}

fn map_string(value: &JsonValue, f: impl Fn(&str) -> String) -> JsonValue {
    match value {
        JsonValue::String(s) => JsonValue::String(f(s)),
        other => other.clone(),
    }
}

fn titlecase(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            word_start = true;
            out.push(ch);
        } else if word_start {
            out.extend(ch.to_uppercase());
            word_start = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn as_float(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        JsonValue::String(s) => leading_float(s),
        _ => f64::NAN,
    }
}

/// Parse the longest numeric prefix of `text` after leading whitespace:
/// `"3abc"` is 3, `"Infinity"` is infinite, `"inf"` and `"abc"` are NaN.
fn leading_float(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if text[end..].starts_with("Infinity") {
        return if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let integral = digits(end);
    end += integral;
    let mut fraction = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction = digits(end + 1);
        if integral + fraction > 0 {
            end += 1 + fraction;
        }
    }
    if integral + fraction == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().unwrap_or(f64::NAN)
}

fn as_length(value: &JsonValue) -> Option<usize> {
    let n = match value {
        JsonValue::Number(n) => n.as_f64()?,
        JsonValue::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if n.is_nan() {
        return None;
    }
    Some(n.max(0.0) as usize)
}
