// ABOUTME: Compiled template form and the strict renderer that evaluates it
// ABOUTME: Substitutes variables, applies helpers and evaluates conditional blocks

use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::context::{format_value, is_not_empty, is_present, is_truthy, Bindings};
use super::error::{RenderError, Result};
use super::helpers::{HelperRegistry, Param};
use super::parser::{Argument, Block, BlockKind, HelperInvocation, Node, Parser, VariableRef};

/// A parsed template, reusable across any number of renders
#[derive(Debug)]
pub struct CompiledTemplate {
    source: String,
    nodes: Vec<Node>,
    helpers: Arc<HelperRegistry>,
}

impl CompiledTemplate {
    /// Parse `source` against the given helper registry
    pub fn compile(source: &str, helpers: Arc<HelperRegistry>) -> Result<Self> {
        let nodes = Parser::new(&helpers).parse(source)?;
        Ok(Self {
            source: source.to_string(),
            nodes,
            helpers,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render in strict mode: an unbound variable outside a block condition
    /// is an error
    pub fn render(&self, bindings: &Bindings) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        self.render_nodes(&self.nodes, bindings, &mut out)?;
        Ok(out)
    }

    fn render_nodes(
        &self,
        nodes: &[Node],
        bindings: &Bindings,
        out: &mut String,
    ) -> std::result::Result<(), RenderError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable(variable) => {
                    let value = self.resolve_variable(variable, bindings)?;
                    out.push_str(&format_value(&value));
                }
                Node::Helper(invocation) => {
                    let value = self.invoke(invocation, bindings)?;
                    out.push_str(&format_value(&value));
                }
                Node::Block(block) => {
                    let branch = if block_passes(block, bindings) {
                        &block.body
                    } else {
                        &block.inverse
                    };
                    self.render_nodes(branch, bindings, out)?;
                }
            }
        }
        Ok(())
    }

    fn resolve_variable(
        &self,
        variable: &VariableRef,
        bindings: &Bindings,
    ) -> std::result::Result<JsonValue, RenderError> {
        let value = bindings
            .lookup(&variable.path)
            .ok_or_else(|| RenderError::MissingVariable {
                name: variable.path.clone(),
            })?;

        match &variable.pipe {
            Some(pipe) => {
                let params: Vec<Param> = std::iter::once(Param::Bound(value.clone()))
                    .chain(pipe.args.iter().map(|arg| resolve_argument(arg, bindings)))
                    .collect();
                self.helpers.call(&pipe.helper, &params)
            }
            None => Ok(value.clone()),
        }
    }

    fn invoke(
        &self,
        invocation: &HelperInvocation,
        bindings: &Bindings,
    ) -> std::result::Result<JsonValue, RenderError> {
        let params: Vec<Param> = invocation
            .args
            .iter()
            .map(|arg| resolve_argument(arg, bindings))
            .collect();
        self.helpers.call(&invocation.name, &params)
    }
}

fn resolve_argument(argument: &Argument, bindings: &Bindings) -> Param {
    match argument {
        Argument::Quoted(text) => Param::Literal(JsonValue::String(text.clone())),
        Argument::Word { text, fallback } => match bindings.lookup(text) {
            Some(value) => Param::Bound(value.clone()),
            None => Param::Unbound(fallback.clone()),
        },
    }
}

fn block_passes(block: &Block, bindings: &Bindings) -> bool {
    let value = bindings.lookup(&block.condition);
    match block.kind {
        BlockKind::If => is_truthy(value),
        BlockKind::IfExists => is_present(value),
        BlockKind::IfNotEmpty => is_not_empty(value),
    }
}
