// ABOUTME: Compiled-template cache keyed by the literal template source text
// ABOUTME: Unbounded, guarded by a read/write lock so engines can be shared across threads

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::render::CompiledTemplate;

/// Cache of compiled templates. Entries live until [`TemplateCache::clear`].
#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<String, Arc<CompiledTemplate>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source: &str) -> Option<Arc<CompiledTemplate>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .cloned()
    }

    /// Insert a compiled template, returning the entry that ends up cached.
    /// When another caller cached the same source first, theirs is kept.
    pub fn insert(&self, compiled: CompiledTemplate) -> Arc<CompiledTemplate> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(compiled.source().to_string())
            .or_insert_with(|| Arc::new(compiled))
            .clone()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
