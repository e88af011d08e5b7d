// ABOUTME: Variable extraction from raw template text
// ABOUTME: Lists referenced variable names in first-occurrence order without compiling

use std::collections::HashSet;

use super::helpers::HelperRegistry;
use super::parser::{classify, is_helper_invocation, placeholders, variable_name, Tag};

/// Names referenced by plain placeholders, deduplicated, in order of first
/// occurrence.
///
/// Block tags, partials and `else` are skipped, as are helper invocations
/// (`{{truncate text 20}}` does not name `text`). Works on text that would
/// not compile; scanning stops at an unclosed `{{`.
pub fn extract_variables(template: &str, registry: &HelperRegistry) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for placeholder in placeholders(template) {
        let Tag::Expression(expression) = classify(placeholder.inner) else {
            continue;
        };
        if is_helper_invocation(expression, registry) {
            continue;
        }

        let name = variable_name(expression);
        if !name.is_empty() && seen.insert(name) {
            names.push(name.to_string());
        }
    }

    names
}

/// Every name the template could read from its bindings: plain placeholders,
/// block conditions and bare-word helper arguments.
///
/// Broader than [`extract_variables`]; bare words that turn out to be
/// literals (`20`, `"+"`) are excluded when they cannot be names.
pub fn referenced_names(template: &str, registry: &HelperRegistry) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut record = |name: &str| {
        if is_name(name) && seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    };

    for placeholder in placeholders(template) {
        match classify(placeholder.inner) {
            Tag::Open(open) => {
                if let Some(condition) = open.split_whitespace().nth(1) {
                    record(condition);
                }
            }
            Tag::Expression(expression) if is_helper_invocation(expression, registry) => {
                expression.split_whitespace().skip(1).for_each(&mut record);
            }
            Tag::Expression(expression) => record(variable_name(expression)),
            Tag::Close(_) | Tag::Partial | Tag::Else => {}
        }
    }

    names
}

fn is_name(word: &str) -> bool {
    word.chars()
        .next()
        .map(|c| c.is_alphabetic() || c == '_')
        .unwrap_or(false)
        && !word.contains(['"', '\''])
        && !matches!(word, "true" | "false" | "null")
}
