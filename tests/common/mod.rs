// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides temp-dir environments and a builder for prompt document fixtures

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;

pub struct TestPromptBuilder {
    name: String,
    description: Option<String>,
    content: String,
    variables: Vec<TestVariable>,
}

pub struct TestVariable {
    pub name: String,
    pub kind: String,
    pub required: bool,
    pub default: Option<String>,
    pub example: Option<String>,
    pub options: Vec<String>,
}

impl TestVariable {
    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "text".to_string(),
            required: false,
            default: None,
            example: None,
            options: Vec::new(),
        }
    }

    pub fn of_kind(name: &str, kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::text(name)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Raw YAML scalar, e.g. `Hello`, `3`, `true`
    pub fn default(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }

    pub fn example(mut self, value: &str) -> Self {
        self.example = Some(value.to_string());
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }
}

impl TestPromptBuilder {
    pub fn new(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            content: content.to_string(),
            variables: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_variable(mut self, variable: TestVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub async fn write_to_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        fs::write(path, self.generate_yaml()).await?;
        Ok(())
    }

    pub fn generate_yaml(&self) -> String {
        let mut yaml = format!("name: {}\n", self.name);

        if let Some(description) = &self.description {
            yaml.push_str(&format!("description: \"{}\"\n", description));
        }

        yaml.push_str("content: |\n");
        for line in self.content.lines() {
            yaml.push_str(&format!("  {}\n", line));
        }

        if !self.variables.is_empty() {
            yaml.push_str("variables:\n");
            for variable in &self.variables {
                yaml.push_str(&format!("  - name: {}\n", variable.name));
                yaml.push_str(&format!("    type: {}\n", variable.kind));
                if variable.required {
                    yaml.push_str("    required: true\n");
                }
                if let Some(default) = &variable.default {
                    yaml.push_str(&format!("    default: {}\n", default));
                }
                if let Some(example) = &variable.example {
                    yaml.push_str(&format!("    example: {}\n", example));
                }
                if !variable.options.is_empty() {
                    yaml.push_str("    options:\n");
                    for option in &variable.options {
                        yaml.push_str(&format!("      - {}\n", option));
                    }
                }
            }
        }

        yaml
    }
}

pub struct TestEnvironment {
    pub temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Path of a config file that does not exist, so tests ignore any
    /// promptsmith.yaml on the host
    pub fn no_config(&self) -> PathBuf {
        self.file("absent-config.yaml")
    }

    pub async fn create_template_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.file(name);
        fs::write(&path, content)
            .await
            .expect("Failed to write template file");
        path
    }

    pub async fn create_document_file(&self, name: &str, builder: &TestPromptBuilder) -> PathBuf {
        let path = self.file(&format!("{}.yaml", name));
        builder
            .write_to_file(&path)
            .await
            .expect("Failed to write prompt document");
        path
    }
}
