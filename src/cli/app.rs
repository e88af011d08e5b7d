// ABOUTME: Main application orchestration for the promptsmith CLI
// ABOUTME: Coordinates between CLI arguments, configuration, and command execution

use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use super::commands;
use super::{Args, Commands, Config};
use crate::template::TemplateEngine;

pub struct App {
    config: Config,
    engine: TemplateEngine,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self {
            config,
            engine: TemplateEngine::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Initialize logging based on configuration
    pub fn init_logging(&self, verbose: bool, no_color: bool) -> Result<()> {
        let log_level = if verbose {
            "debug"
        } else {
            &self.config.logging.level
        };

        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        // Rendered prompts go to stdout, so logs go to stderr
        let result = match self.config.logging.format.as_str() {
            "compact" => tracing_subscriber::fmt()
                .compact()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init(),
            _ => tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_ansi(!no_color)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init(),
        };
        result.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

        debug!("Logging initialized with level: {}", log_level);
        Ok(())
    }

    /// Run the application with parsed arguments
    pub async fn run(&mut self, args: Args) -> Result<()> {
        self.init_logging(args.verbose, args.no_color)?;

        info!("Starting promptsmith v{}", env!("CARGO_PKG_VERSION"));
        debug!("Configuration loaded from: {:?}", args.config);

        match args.command {
            Commands::Render {
                template,
                vars,
                vars_file,
                no_cache,
                fallback,
            } => {
                let options = commands::RenderOptions {
                    cache_enabled: self.config.cache_enabled && !no_cache,
                    fallback: fallback || self.config.fallback_on_error,
                };
                let rendered = commands::render_template(
                    &self.engine,
                    template,
                    &vars,
                    vars_file,
                    options,
                    &self.config,
                )
                .await?;
                print!("{}", rendered);
                Ok(())
            }

            Commands::Validate {
                template,
                vars,
                vars_file,
                balance_only,
            } => {
                commands::validate_template(
                    &self.engine,
                    template,
                    &vars,
                    vars_file,
                    balance_only,
                )
                .await
            }

            Commands::Variables { template, json } => {
                commands::list_variables(&self.engine, template, json).await
            }
        }
    }

    /// Create application from command line arguments
    pub fn from_args(args: &Args) -> Result<Self> {
        let config = Config::load(args.config.clone())?;
        Ok(Self::new(config))
    }
}
