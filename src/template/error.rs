// ABOUTME: Error types for template engine operations
// ABOUTME: Separates compile-time syntax errors from render-time failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template syntax error at byte {offset}: {message}")]
    Syntax { message: String, offset: usize },

    #[error("Template render error: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid bindings: {0}")]
    InvalidBindings(String),
}

/// Underlying cause of a failed render.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("\"{name}\" not defined")]
    MissingVariable { name: String },

    #[error("helper '{helper}' failed: {reason}")]
    Helper { helper: String, reason: String },
}

impl TemplateError {
    pub(crate) fn syntax(message: impl Into<String>, offset: usize) -> Self {
        TemplateError::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, TemplateError::Syntax { .. })
    }

    pub fn is_render(&self) -> bool {
        matches!(self, TemplateError::Render(_))
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
