// ABOUTME: Error types for prompt document parsing and binding resolution
// ABOUTME: Defines specific error types for document module operations

use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to read prompt document: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Prompt document '{0}' has empty content")]
    EmptyContent(String),

    #[error("Duplicate variable definition: {name}")]
    DuplicateVariable { name: String },

    #[error("Invalid value for variable '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    #[error("Required variable '{name}' has no value")]
    MissingRequired { name: String },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub type Result<T> = std::result::Result<T, DocumentError>;
