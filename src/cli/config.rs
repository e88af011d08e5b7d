// ABOUTME: Configuration management for the promptsmith application
// ABOUTME: Handles loading and merging configuration from files and environment variables

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::template::Bindings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    #[serde(default)]
    pub fallback_on_error: bool,

    #[serde(default)]
    pub default_vars: HashMap<String, JsonValue>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            fallback_on_error: false,
            default_vars: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file path or default locations
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => Self::find_config_file(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config {}", config_path.display()))?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("Invalid config {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.merge_env()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> PathBuf {
        let possible_paths = [
            PathBuf::from("promptsmith.yaml"),
            PathBuf::from("promptsmith.yml"),
            PathBuf::from(".promptsmith.yaml"),
            PathBuf::from(".promptsmith.yml"),
        ];

        // Check current directory
        for path in possible_paths {
            if path.exists() {
                return path;
            }
        }

        // Check home directory
        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".promptsmith").join("config.yaml");
            if home_config.exists() {
                return home_config;
            }
        }

        // Return default path (may not exist)
        PathBuf::from("promptsmith.yaml")
    }

    /// Merge environment variables into configuration
    fn merge_env(&mut self) -> Result<()> {
        if let Ok(level) = std::env::var("PROMPTSMITH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PROMPTSMITH_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(cache) = std::env::var("PROMPTSMITH_CACHE") {
            self.cache_enabled = cache
                .parse()
                .with_context(|| format!("PROMPTSMITH_CACHE must be true or false, got '{}'", cache))?;
        }
        if let Ok(fallback) = std::env::var("PROMPTSMITH_FALLBACK") {
            self.fallback_on_error = fallback.parse().with_context(|| {
                format!("PROMPTSMITH_FALLBACK must be true or false, got '{}'", fallback)
            })?;
        }

        Ok(())
    }

    /// Configured default variables as bindings
    pub fn default_bindings(&self) -> Bindings {
        self.default_vars
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}
