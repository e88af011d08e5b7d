// ABOUTME: Prompt document data structures and YAML parsing
// ABOUTME: Resolves bindings from declared variables and checks documents against the engine

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use super::error::{DocumentError, Result};
use super::variable::VariableDefinition;
use crate::template::{referenced_names, Bindings, TemplateEngine, ValidationResult};

/// A prompt template together with the variables it declares
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            content: content.into(),
            variables: Vec::new(),
        }
    }

    pub fn with_variable(mut self, definition: VariableDefinition) -> Self {
        self.variables.push(definition);
        self
    }

    /// Parse prompt document from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(DocumentError::IoError)?;
        Self::from_yaml(&content)
    }

    /// Parse prompt document from YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let document: PromptTemplate =
            serde_yaml::from_str(content).map_err(DocumentError::YamlError)?;
        document.validate_structure()?;
        Ok(document)
    }

    fn validate_structure(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(DocumentError::MissingField("name".to_string()));
        }

        if self.content.trim().is_empty() {
            return Err(DocumentError::EmptyContent(self.name.clone()));
        }

        let mut names = HashSet::new();
        for definition in &self.variables {
            if definition.name.trim().is_empty() {
                return Err(DocumentError::MissingField("variables[].name".to_string()));
            }
            if !names.insert(definition.name.as_str()) {
                return Err(DocumentError::DuplicateVariable {
                    name: definition.name.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Bindings made of each variable's default
    pub fn default_bindings(&self) -> Bindings {
        self.variables
            .iter()
            .filter_map(|v| v.default.clone().map(|value| (v.name.clone(), value)))
            .collect()
    }

    /// Bindings used for previews: each variable's example, else its default
    pub fn example_bindings(&self) -> Bindings {
        self.variables
            .iter()
            .filter_map(|v| v.preview_value().map(|value| (v.name.clone(), value.clone())))
            .collect()
    }

    /// Overlay `overrides` on the declared defaults and check every declared
    /// variable. Values are normalized to their declared kind; undeclared
    /// overrides pass through unchanged.
    pub fn resolve_bindings(&self, overrides: &Bindings) -> Result<Bindings> {
        let mut bindings = self.default_bindings();
        bindings.extend(overrides.clone());

        for definition in &self.variables {
            match bindings.get(&definition.name) {
                Some(value) if !value.is_null() => {
                    let normalized =
                        definition
                            .coerce(value)
                            .map_err(|reason| DocumentError::InvalidValue {
                                name: definition.name.clone(),
                                reason,
                            })?;
                    bindings.set(definition.name.clone(), normalized);
                }
                _ if definition.required => {
                    return Err(DocumentError::MissingRequired {
                        name: definition.name.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(bindings)
    }

    /// Resolve bindings and render the content in strict mode
    pub fn render(&self, engine: &TemplateEngine, overrides: &Bindings) -> Result<String> {
        let bindings = self.resolve_bindings(overrides)?;
        Ok(engine.render(&self.content, &bindings)?)
    }

    /// Check the document against the engine.
    ///
    /// Combines the engine's compile and missing-variable check (using the
    /// example bindings) with declaration checks: referenced variables that
    /// are not declared, declared variables that are never used (warning
    /// only), and defaults or examples that do not fit their kind.
    pub fn check(&self, engine: &TemplateEngine) -> ValidationResult {
        self.check_with(engine, &Bindings::new())
    }

    /// [`PromptTemplate::check`] with extra example bindings layered over the
    /// declared examples
    pub fn check_with(&self, engine: &TemplateEngine, extra: &Bindings) -> ValidationResult {
        let mut example = self.example_bindings();
        example.extend(extra.clone());
        let mut result = engine.validate(&self.content, Some(&example));

        let declared: HashSet<&str> = self.variables.iter().map(|v| v.name.as_str()).collect();
        let undeclared: Vec<String> = engine
            .extract_variables(&self.content)
            .into_iter()
            .filter(|name| !declared.contains(root_name(name)))
            .collect();
        if !undeclared.is_empty() {
            let mut declarations = ValidationResult::valid();
            declarations.add_error(format!("Undeclared variables: {}", undeclared.join(", ")));
            declarations.missing_variables = undeclared;
            result.merge(declarations);
        }

        let referenced: HashSet<String> = referenced_names(&self.content, engine.helpers())
            .iter()
            .map(|name| root_name(name).to_string())
            .collect();

        for definition in &self.variables {
            if !referenced.contains(&definition.name) {
                result.add_warning(format!(
                    "Variable '{}' is declared but never used",
                    definition.name
                ));
            }

            let candidates = [("default", &definition.default), ("example", &definition.example)];
            for (label, value) in candidates {
                if let Some(Err(reason)) = value.as_ref().map(|v| definition.coerce(v)) {
                    result.add_error(format!(
                        "Invalid {} for variable '{}': {}",
                        label, definition.name, reason
                    ));
                }
            }
        }

        result
    }

    /// Convert document back to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(DocumentError::YamlError)
    }

    /// Save document to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        std::fs::write(path.as_ref(), yaml).map_err(DocumentError::IoError)?;
        Ok(())
    }
}

/// Top-level binding name of a dotted path
fn root_name(path: &str) -> &str {
    path.split('.').next().unwrap_or(path)
}

#[derive(Debug, Clone)]
pub struct PromptParser;

impl PromptParser {
    pub fn new() -> Self {
        Self
    }

    pub async fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<PromptTemplate> {
        let content = fs::read_to_string(path.as_ref())
            .await
            .map_err(DocumentError::IoError)?;
        self.parse_string(&content)
    }

    pub fn parse_string(&self, content: &str) -> Result<PromptTemplate> {
        PromptTemplate::from_yaml(content)
    }
}

impl Default for PromptParser {
    fn default() -> Self {
        Self::new()
    }
}
