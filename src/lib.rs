// ABOUTME: Main library module for the promptsmith prompt template engine
// ABOUTME: Exports the template engine, prompt documents and CLI components

pub mod cli;
pub mod document;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use document::{PromptParser, PromptTemplate, VariableDefinition, VariableKind};
pub use template::{Bindings, TemplateEngine, TemplateError, ValidationResult};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
