// ABOUTME: Template parser turning `{{...}}` placeholder text into a node tree
// ABOUTME: Classifies placeholders into blocks, helper invocations and variable references

use serde_json::Value as JsonValue;
use std::fmt;
use tracing::warn;

use super::error::{Result, TemplateError};
use super::helpers::HelperRegistry;

pub(crate) const OPEN: &str = "{{";
pub(crate) const CLOSE: &str = "}}";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Variable(VariableRef),
    Helper(HelperInvocation),
    Block(Block),
}

/// `{{name}}` or `{{name|helper arg...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    pub path: String,
    pub pipe: Option<Pipe>,
}

/// Helper applied to a variable's value; `args` follow the value
#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub helper: String,
    pub args: Vec<Argument>,
}

/// `{{helper arg1 "arg 2" ...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct HelperInvocation {
    pub name: String,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Quoted string literal
    Quoted(String),
    /// Bare word: a binding name when bound, otherwise `fallback`
    Word { text: String, fallback: JsonValue },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    If,
    IfExists,
    IfNotEmpty,
}

impl BlockKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "if" => Some(BlockKind::If),
            "ifExists" => Some(BlockKind::IfExists),
            "ifNotEmpty" => Some(BlockKind::IfNotEmpty),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::If => "if",
            BlockKind::IfExists => "ifExists",
            BlockKind::IfNotEmpty => "ifNotEmpty",
        }
    }

    fn allows_else(&self) -> bool {
        !matches!(self, BlockKind::If)
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `{{#kind condition}} body {{else}} inverse {{/kind}}`
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub condition: String,
    pub body: Vec<Node>,
    pub inverse: Vec<Node>,
}

/// A `{{...}}` span located in the source text
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Placeholder<'a> {
    pub start: usize,
    pub end: usize,
    pub inner: &'a str,
}

/// Iterator over complete placeholders. Stops at an opening `{{` that has no
/// closing `}}`.
pub(crate) struct Placeholders<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Placeholders<'a> {
    /// Byte offset just past the last placeholder returned
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.pos + self.text[self.pos..].find(OPEN)?;
        let inner_start = start + OPEN.len();
        let inner_end = inner_start + self.text[inner_start..].find(CLOSE)?;
        let end = inner_end + CLOSE.len();
        self.pos = end;
        Some(Placeholder {
            start,
            end,
            inner: &self.text[inner_start..inner_end],
        })
    }
}

pub(crate) fn placeholders(text: &str) -> Placeholders<'_> {
    Placeholders { text, pos: 0 }
}

/// Placeholder classification by leading marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Tag<'a> {
    Open(&'a str),
    Close(&'a str),
    Partial,
    Else,
    Expression(&'a str),
}

pub(crate) fn classify(inner: &str) -> Tag<'_> {
    let inner = inner.trim();
    if let Some(rest) = inner.strip_prefix('#') {
        Tag::Open(rest.trim())
    } else if let Some(rest) = inner.strip_prefix('/') {
        Tag::Close(rest.trim())
    } else if inner.starts_with('>') {
        Tag::Partial
    } else if inner == "else" {
        Tag::Else
    } else {
        Tag::Expression(inner)
    }
}

/// Variable name of a non-helper expression: the first token with any
/// `|helper` suffix removed
pub(crate) fn variable_name(expression: &str) -> &str {
    expression
        .split('|')
        .next()
        .and_then(|left| left.split_whitespace().next())
        .unwrap_or("")
}

/// True when the expression is a helper invocation: a registered helper name
/// followed by at least one argument. `{{count | uppercase}}` is a piped
/// variable, not an invocation.
pub(crate) fn is_helper_invocation(expression: &str, registry: &HelperRegistry) -> bool {
    let mut tokens = expression.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(first), Some(second)) => registry.contains(first) && !second.starts_with('|'),
        _ => false,
    }
}

struct OpenBlock {
    kind: BlockKind,
    condition: String,
    offset: usize,
    body: Vec<Node>,
    inverse: Vec<Node>,
    in_else: bool,
}

pub struct Parser<'r> {
    registry: &'r HelperRegistry,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r HelperRegistry) -> Self {
        Self { registry }
    }

    /// Parse template text into nodes
    pub fn parse(&self, source: &str) -> Result<Vec<Node>> {
        let mut root = Vec::new();
        let mut stack: Vec<OpenBlock> = Vec::new();
        let mut scanner = placeholders(source);
        let mut last = 0;

        for placeholder in scanner.by_ref() {
            if placeholder.start > last {
                let text = &source[last..placeholder.start];
                current(&mut root, &mut stack).push(Node::Text(text.to_string()));
            }
            last = placeholder.end;

            let offset = placeholder.start;
            if placeholder.inner.contains(OPEN) {
                return Err(TemplateError::syntax(
                    "unclosed placeholder: '{{' before the matching '}}'",
                    offset,
                ));
            }
            match classify(placeholder.inner) {
                Tag::Open(open) => stack.push(self.open_block(open, offset)?),
                Tag::Close(name) => {
                    let block = close_block(&mut stack, name, offset)?;
                    current(&mut root, &mut stack).push(Node::Block(block));
                }
                Tag::Else => match stack.last_mut() {
                    Some(top) if top.kind.allows_else() && !top.in_else => top.in_else = true,
                    Some(top) if top.in_else => {
                        return Err(TemplateError::syntax(
                            format!("duplicate {{{{else}}}} in {{{{#{}}}}} block", top.kind),
                            offset,
                        ))
                    }
                    Some(top) => {
                        return Err(TemplateError::syntax(
                            format!("{{{{else}}}} is not supported in {{{{#{}}}}} blocks", top.kind),
                            offset,
                        ))
                    }
                    None => {
                        return Err(TemplateError::syntax(
                            "{{else}} outside of a block",
                            offset,
                        ))
                    }
                },
                Tag::Partial => {}
                Tag::Expression(expression) => {
                    let node = self.parse_expression(expression, offset)?;
                    current(&mut root, &mut stack).push(node);
                }
            }
        }

        let tail = &source[scanner.position()..];
        if let Some(unclosed) = tail.find(OPEN) {
            return Err(TemplateError::syntax(
                "unclosed placeholder: missing '}}'",
                scanner.position() + unclosed,
            ));
        }
        if !tail.is_empty() {
            current(&mut root, &mut stack).push(Node::Text(tail.to_string()));
        }

        if let Some(block) = stack.pop() {
            return Err(TemplateError::syntax(
                format!("unclosed {{{{#{}}}}} block", block.kind),
                block.offset,
            ));
        }

        Ok(root)
    }

    fn open_block(&self, open: &str, offset: usize) -> Result<OpenBlock> {
        let mut tokens = open.split_whitespace();
        let name = tokens.next().unwrap_or("");
        let kind = BlockKind::from_name(name).ok_or_else(|| {
            TemplateError::syntax(format!("unsupported block helper '#{}'", name), offset)
        })?;

        let condition = tokens.next().ok_or_else(|| {
            TemplateError::syntax(format!("{{{{#{}}}}} requires a variable name", kind), offset)
        })?;
        if tokens.next().is_some() {
            return Err(TemplateError::syntax(
                format!(
                    "{{{{#{}}}}} accepts a single variable name, found '{}'",
                    kind, open
                ),
                offset,
            ));
        }

        Ok(OpenBlock {
            kind,
            condition: condition.to_string(),
            offset,
            body: Vec::new(),
            inverse: Vec::new(),
            in_else: false,
        })
    }

    fn parse_expression(&self, expression: &str, offset: usize) -> Result<Node> {
        if expression.is_empty() {
            return Err(TemplateError::syntax("empty placeholder", offset));
        }

        if is_helper_invocation(expression, self.registry) {
            let (name, rest) = expression
                .split_once(char::is_whitespace)
                .unwrap_or((expression, ""));
            let args = tokenize_arguments(rest).map_err(|e| TemplateError::syntax(e, offset))?;
            return Ok(Node::Helper(HelperInvocation {
                name: name.to_string(),
                args,
            }));
        }

        let path = variable_name(expression);
        if path.is_empty() {
            return Err(TemplateError::syntax(
                format!("missing variable name in '{}'", expression),
                offset,
            ));
        }

        let pipe = match expression.split_once('|') {
            Some((_, suffix)) => {
                let suffix = suffix.trim();
                let (helper, rest) = suffix
                    .split_once(char::is_whitespace)
                    .unwrap_or((suffix, ""));
                if helper.is_empty() {
                    return Err(TemplateError::syntax("missing helper name after '|'", offset));
                }
                if self.registry.contains(helper) {
                    let args =
                        tokenize_arguments(rest).map_err(|e| TemplateError::syntax(e, offset))?;
                    Some(Pipe {
                        helper: helper.to_string(),
                        args,
                    })
                } else {
                    // unknown pipe helpers pass the value through unchanged
                    warn!("Unknown helper '{}' in '{{{{{}}}}}' is ignored", helper, expression);
                    None
                }
            }
            None => None,
        };

        Ok(Node::Variable(VariableRef {
            path: path.to_string(),
            pipe,
        }))
    }
}

fn current<'a>(root: &'a mut Vec<Node>, stack: &'a mut [OpenBlock]) -> &'a mut Vec<Node> {
    match stack.last_mut() {
        Some(top) if top.in_else => &mut top.inverse,
        Some(top) => &mut top.body,
        None => root,
    }
}

fn close_block(stack: &mut Vec<OpenBlock>, name: &str, offset: usize) -> Result<Block> {
    let open = stack.pop().ok_or_else(|| {
        TemplateError::syntax(format!("unexpected {{{{/{}}}}} without an open block", name), offset)
    })?;

    if open.kind.name() != name {
        return Err(TemplateError::syntax(
            format!("expected {{{{/{}}}}} but found {{{{/{}}}}}", open.kind, name),
            offset,
        ));
    }

    Ok(Block {
        kind: open.kind,
        condition: open.condition,
        body: open.body,
        inverse: open.inverse,
    })
}

/// Split helper arguments on whitespace, keeping quoted strings whole
fn tokenize_arguments(input: &str) -> std::result::Result<Vec<Argument>, String> {
    let mut args = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch == '"' || ch == '\'' {
            chars.next();
            let mut literal = String::new();
            let mut terminated = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.peek() {
                        Some(&next) if next == ch || next == '\\' => {
                            literal.push(next);
                            chars.next();
                        }
                        _ => literal.push(c),
                    },
                    c if c == ch => {
                        terminated = true;
                        break;
                    }
                    c => literal.push(c),
                }
            }
            if !terminated {
                return Err(format!("unterminated string literal starting with {}", ch));
            }
            args.push(Argument::Quoted(literal));
        } else {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                word.push(c);
                chars.next();
            }
            let fallback = literal_value(&word);
            args.push(Argument::Word {
                text: word,
                fallback,
            });
        }
    }

    Ok(args)
}

/// Interpret a bare word as a literal value
fn literal_value(word: &str) -> JsonValue {
    match word {
        "true" => JsonValue::Bool(true),
        "false" => JsonValue::Bool(false),
        "null" => JsonValue::Null,
        _ => {
            if let Ok(i) = word.parse::<i64>() {
                JsonValue::from(i)
            } else if let Some(n) = word
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(serde_json::Number::from_f64)
            {
                JsonValue::Number(n)
            } else {
                JsonValue::String(word.to_string())
            }
        }
    }
}
