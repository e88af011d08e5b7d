// ABOUTME: Prompt document module for YAML templates with typed variables
// ABOUTME: Exports document parsing, variable definitions and binding resolution

pub mod error;
pub mod prompt;
pub mod variable;

pub use error::{DocumentError, Result};
pub use prompt::{PromptParser, PromptTemplate};
pub use variable::{VariableDefinition, VariableKind};
