// ABOUTME: Plain substitution processor used as a non-strict fallback
// ABOUTME: Replaces bound `{{name}}` placeholders and leaves everything else verbatim

use super::context::{format_value, Bindings};
use super::parser::placeholders;

/// Replace every `{{ name }}` whose trimmed content is a bound name.
///
/// Unbound placeholders, blocks and helper calls are copied through
/// untouched. Never fails.
pub fn substitute(template: &str, bindings: &Bindings) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for placeholder in placeholders(template) {
        if let Some(value) = bindings.lookup(placeholder.inner.trim()) {
            out.push_str(&template[last..placeholder.start]);
            out.push_str(&format_value(value));
            last = placeholder.end;
        }
    }

    out.push_str(&template[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_substitutes_bound_names_only() {
        let bindings = Bindings::new().with("name", "Ada").with("count", 3);
        assert_eq!(
            substitute("Hi {{ name }}, {{count}} new, {{unset}}", &bindings),
            "Hi Ada, 3 new, {{unset}}"
        );
    }

    #[test]
    fn test_leaves_blocks_and_broken_syntax() {
        let bindings = Bindings::new().with("flag", true).with("user", json!({"n": "x"}));
        assert_eq!(
            substitute("{{#if flag}}{{user.n}}{{/if}} {{oops", &bindings),
            "{{#if flag}}x{{/if}} {{oops"
        );
    }
}
