//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Provisor - Converge hosts toward declarative recipe state
#[derive(Parser, Debug)]
#[command(name = "provisor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply one or more recipes to this host
    Apply(commands::apply::ApplyArgs),

    /// Parse recipes and summarize their steps without touching the host
    Check(commands::check::CheckArgs),

    /// Validate recipe structure and template variables
    Validate(commands::validate::ValidateArgs),

    /// Render a recipe's file artifacts without applying anything
    Render(commands::render::RenderArgs),

    /// List the steps of a recipe in order
    Ls(commands::ls::LsArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(self.log_level.as_str()),
        )
        .init();

        let output = crate::commands::output_config(&self.color);

        match self.command {
            Commands::Apply(args) => commands::apply::execute(args, &output),
            Commands::Check(args) => commands::check::execute(args),
            Commands::Validate(args) => commands::validate::execute(args),
            Commands::Render(args) => commands::render::execute(args),
            Commands::Ls(args) => commands::ls::execute(args),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
