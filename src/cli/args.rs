// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the main CLI structure and subcommands for promptsmith

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "promptsmith")]
#[command(about = "Render, inspect and validate prompt templates")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a template or prompt document
    Render {
        #[arg(help = "Path to a template file or YAML prompt document")]
        template: PathBuf,

        #[arg(short = 'V', long = "var", help = "Set a template variable (key=value)")]
        vars: Vec<String>,

        #[arg(long, help = "JSON or YAML file with variable bindings")]
        vars_file: Option<PathBuf>,

        #[arg(long, help = "Compile without using the template cache")]
        no_cache: bool,

        #[arg(long, help = "Fall back to plain substitution if strict rendering fails")]
        fallback: bool,
    },

    /// Validate a template or prompt document
    Validate {
        #[arg(help = "Path to a template file or YAML prompt document")]
        template: PathBuf,

        #[arg(short = 'V', long = "var", help = "Example variable (key=value)")]
        vars: Vec<String>,

        #[arg(long, help = "JSON or YAML file with example bindings")]
        vars_file: Option<PathBuf>,

        #[arg(long, help = "Only check that tags are balanced")]
        balance_only: bool,
    },

    /// List the variables a template references
    Variables {
        #[arg(help = "Path to a template file or YAML prompt document")]
        template: PathBuf,

        #[arg(long, help = "Print as a JSON array")]
        json: bool,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(vars: &[String]) -> anyhow::Result<HashMap<String, String>> {
        let mut variables = HashMap::new();

        for var in vars {
            if let Some((key, value)) = var.split_once('=') {
                variables.insert(key.to_string(), value.to_string());
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid variable format '{}'. Expected 'key=value'",
                    var
                ));
            }
        }

        Ok(variables)
    }
}
