// ABOUTME: Prompt template engine module
// ABOUTME: Compiles, caches, renders, inspects and validates `{{...}}` templates

pub mod cache;
pub mod context;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod helpers;
pub mod parser;
pub mod render;
pub mod validation;

pub use cache::TemplateCache;
pub use context::Bindings;
pub use engine::TemplateEngine;
pub use error::{RenderError, Result, TemplateError};
pub use extract::{extract_variables, referenced_names};
pub use fallback::substitute;
pub use helpers::{Clock, FixedClock, HelperRegistry, SystemClock};
pub use render::CompiledTemplate;
pub use validation::{validate_tag_balance, ValidationResult};
