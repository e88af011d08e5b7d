// ABOUTME: Main template engine tying together compilation, caching and rendering
// ABOUTME: Provides compile, render, validate, variable extraction and cache control

use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, warn};

use super::cache::TemplateCache;
use super::context::Bindings;
use super::error::Result;
use super::extract::extract_variables;
use super::fallback::substitute;
use super::helpers::{Clock, HelperRegistry};
use super::render::CompiledTemplate;
use super::validation::ValidationResult;

/// Prompt template engine.
///
/// Each engine owns its compiled-template cache. Clones share the cache and
/// the helper registry.
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    helpers: Arc<HelperRegistry>,
    cache: Arc<TemplateCache>,
}

impl TemplateEngine {
    /// Create a new template engine with all built-in helpers
    pub fn new() -> Self {
        Self::with_registry(HelperRegistry::new())
    }

    /// Create an engine whose `datetime` helper reads the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_registry(HelperRegistry::with_clock(clock))
    }

    pub fn with_registry(helpers: HelperRegistry) -> Self {
        Self {
            helpers: Arc::new(helpers),
            cache: Arc::new(TemplateCache::new()),
        }
    }

    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// Compile a template, reusing the cached form for identical source text
    pub fn compile(&self, template: &str, cache_enabled: bool) -> Result<Arc<CompiledTemplate>> {
        if cache_enabled {
            if let Some(compiled) = self.cache.get(template) {
                debug!("Template cache hit ({} bytes)", template.len());
                return Ok(compiled);
            }
        }

        debug!("Compiling template ({} bytes)", template.len());
        let compiled = CompiledTemplate::compile(template, Arc::clone(&self.helpers))?;

        if cache_enabled {
            Ok(self.cache.insert(compiled))
        } else {
            Ok(Arc::new(compiled))
        }
    }

    /// Render a template string in strict mode
    pub fn render(&self, template: &str, bindings: &Bindings) -> Result<String> {
        self.compile(template, true)?.render(bindings)
    }

    /// Render a template string with a JSON object of bindings
    pub fn render_json(&self, template: &str, bindings: &JsonValue) -> Result<String> {
        let bindings = Bindings::from_json(bindings.clone())?;
        self.render(template, &bindings)
    }

    /// Strict render that degrades to plain substitution on any failure
    pub fn render_or_substitute(&self, template: &str, bindings: &Bindings) -> String {
        match self.render(template, bindings) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("Falling back to plain substitution: {}", e);
                substitute(template, bindings)
            }
        }
    }

    /// Check that a template compiles and, when example bindings are given,
    /// that every referenced variable is bound
    pub fn validate(&self, template: &str, example: Option<&Bindings>) -> ValidationResult {
        let mut result = ValidationResult::valid();

        if let Err(e) = self.compile(template, true) {
            result.add_error(e.to_string());
        }

        if let Some(example) = example {
            let missing: Vec<String> = self
                .extract_variables(template)
                .into_iter()
                .filter(|name| !example.contains(name))
                .collect();

            if !missing.is_empty() {
                result.add_error(format!("Missing variables: {}", missing.join(", ")));
                result.missing_variables = missing;
            }
        }

        result
    }

    /// Variable names referenced by the template, in first-occurrence order
    pub fn extract_variables(&self, template: &str) -> Vec<String> {
        extract_variables(template, &self.helpers)
    }

    pub fn clear_cache(&self) {
        debug!("Clearing {} cached templates", self.cache.len());
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
