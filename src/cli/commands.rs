// ABOUTME: Command implementations for the promptsmith CLI
// ABOUTME: Handles execution of render, validate and variables commands

use anyhow::{anyhow, Result};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use super::args::Args;
use super::config::Config;
use crate::document::{PromptParser, PromptTemplate};
use crate::template::{substitute, validate_tag_balance, Bindings, TemplateEngine};

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub cache_enabled: bool,
    pub fallback: bool,
}

/// Template input: raw template text or a YAML prompt document
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Raw(String),
    Document(PromptTemplate),
}

impl TemplateSource {
    pub fn content(&self) -> &str {
        match self {
            TemplateSource::Raw(text) => text,
            TemplateSource::Document(document) => &document.content,
        }
    }
}

/// Render a template or prompt document
pub async fn render_template(
    engine: &TemplateEngine,
    template_path: PathBuf,
    vars: &[String],
    vars_file: Option<PathBuf>,
    options: RenderOptions,
    config: &Config,
) -> Result<String> {
    info!("Rendering template: {}", template_path.display());

    let source = load_source(&template_path).await?;
    let supplied = load_bindings(vars, vars_file).await?;
    info!("Loaded {} variable bindings", supplied.len());

    let mut bindings = config.default_bindings();
    let bindings = match &source {
        TemplateSource::Raw(_) => {
            bindings.extend(supplied);
            bindings
        }
        TemplateSource::Document(document) => {
            bindings.extend(document.default_bindings());
            bindings.extend(supplied);
            document
                .resolve_bindings(&bindings)
                .map_err(|e| anyhow!("Invalid variables for '{}': {}", document.name, e))?
        }
    };

    render_text(engine, source.content(), &bindings, options)
}

fn render_text(
    engine: &TemplateEngine,
    text: &str,
    bindings: &Bindings,
    options: RenderOptions,
) -> Result<String> {
    let rendered = engine
        .compile(text, options.cache_enabled)
        .and_then(|compiled| compiled.render(bindings));

    match rendered {
        Ok(output) => Ok(output),
        Err(e) if options.fallback => {
            warn!("Strict render failed, using plain substitution: {}", e);
            Ok(substitute(text, bindings))
        }
        Err(e) => Err(anyhow!("Failed to render template: {}", e)),
    }
}

/// Validate a template or prompt document
pub async fn validate_template(
    engine: &TemplateEngine,
    template_path: PathBuf,
    vars: &[String],
    vars_file: Option<PathBuf>,
    balance_only: bool,
) -> Result<()> {
    info!("Validating template: {}", template_path.display());

    let source = load_source(&template_path).await?;

    let result = if balance_only {
        validate_tag_balance(source.content())
    } else {
        let supplied = load_bindings(vars, vars_file).await?;
        match &source {
            TemplateSource::Raw(text) if supplied.is_empty() => engine.validate(text, None),
            TemplateSource::Raw(text) => engine.validate(text, Some(&supplied)),
            TemplateSource::Document(document) => document.check_with(engine, &supplied),
        }
    };

    for warning in &result.warnings {
        println!("⚠ {}", warning);
    }

    if result.is_valid {
        println!("✓ Template '{}' is valid", template_path.display());
        println!("  Variables: {}", engine.extract_variables(source.content()).len());
        info!("Template validation completed successfully");
        Ok(())
    } else {
        for error in &result.errors {
            println!("✗ {}", error);
        }
        if !result.missing_variables.is_empty() {
            println!("  Missing: {}", result.missing_variables.join(", "));
        }
        Err(anyhow!(
            "Template validation failed with {} error(s)",
            result.errors.len()
        ))
    }
}

/// Print the variables a template references
pub async fn list_variables(engine: &TemplateEngine, template_path: PathBuf, json: bool) -> Result<()> {
    let source = load_source(&template_path).await?;
    let names = engine.extract_variables(source.content());

    if json {
        println!("{}", serde_json::to_string(&names)?);
    } else {
        for name in &names {
            println!("{}", name);
        }
    }

    Ok(())
}

/// Load a template file; `.yaml`/`.yml` files are prompt documents
pub async fn load_source(path: &Path) -> Result<TemplateSource> {
    if is_document(path) {
        let document = PromptParser::new()
            .parse_file(path)
            .await
            .map_err(|e| anyhow!("Failed to parse prompt document '{}': {}", path.display(), e))?;
        Ok(TemplateSource::Document(document))
    } else {
        let text = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read template '{}': {}", path.display(), e))?;
        Ok(TemplateSource::Raw(text))
    }
}

/// Bindings from an optional JSON/YAML file, then `key=value` pairs on top
pub async fn load_bindings(vars: &[String], vars_file: Option<PathBuf>) -> Result<Bindings> {
    let mut bindings = Bindings::new();

    if let Some(path) = vars_file {
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow!("Failed to read variables file '{}': {}", path.display(), e))?;
        let value: JsonValue = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            _ => serde_yaml::from_str(&content)?,
        };
        bindings.extend(Bindings::from_json(value)?);
    }

    let pairs = Args::parse_variables(vars)?;
    bindings.extend(Bindings::from_strings(&pairs));

    Ok(bindings)
}

fn is_document(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}
