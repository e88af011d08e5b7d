// ABOUTME: Validation results and the lightweight tag-balance checker
// ABOUTME: Validation never fails; problems are reported as data

use serde::Serialize;

use super::parser::{CLOSE, OPEN};

/// Outcome of a pre-flight template check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub missing_variables: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            ..Self::default()
        }
    }

    /// Record an error; the result becomes invalid
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Fold another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.is_valid &= other.is_valid;
        self.errors.extend(other.errors);
        for name in other.missing_variables {
            if !self.missing_variables.contains(&name) {
                self.missing_variables.push(name);
            }
        }
        self.warnings.extend(other.warnings);
    }
}

/// Cheap structural check that only counts raw delimiters.
///
/// Compares the number of `{{` and `}}` occurrences, then `{{#if` and
/// `{{/if}}`. It does not parse, so it accepts some templates the compiler
/// rejects and vice versa. `{{#if` also matches `{{#ifExists` and
/// `{{#ifNotEmpty` openers while their closers never match `{{/if}}`, so a
/// template built on those blocks is reported as mismatched.
pub fn validate_tag_balance(template: &str) -> ValidationResult {
    let mut result = ValidationResult::valid();

    let opening = template.matches(OPEN).count();
    let closing = template.matches(CLOSE).count();
    if opening != closing {
        result.add_error(format!(
            "Mismatched template tags: {} opening '{{{{' and {} closing '}}}}'",
            opening, closing
        ));
    }

    let if_open = template.matches("{{#if").count();
    let if_close = template.matches("{{/if}}").count();
    if if_open != if_close {
        result.add_error(format!(
            "Mismatched conditional blocks: {} '{{{{#if' and {} '{{{{/if}}}}'",
            if_open, if_close
        ));
    }

    result
}
