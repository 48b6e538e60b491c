//! # Render Command Implementation
//!
//! This module implements the `render` subcommand, which produces every
//! file artifact a recipe would write (config files, env files, cron
//! fragments, logrotate stanzas) without running any commands or touching
//! the live host. Output goes to stdout, or under a directory with
//! `--output`, for review before a real apply.

use anyhow::Result;
use clap::Args;
use provisor::apply::expand_step;
use provisor::artifact::{CronEntry, EnvFile, LogrotateStanza};
use provisor::bag::Resolver;
use provisor::config::{self, Recipe, Step};
use std::path::PathBuf;

use crate::commands::load_resolver;

/// Render a recipe's file artifacts
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Recipe files to render
    #[arg(value_name = "RECIPE", required = true)]
    pub recipes: Vec<PathBuf>,

    /// Path to the shared data bag (YAML or JSON)
    #[arg(long, value_name = "PATH", env = "PROVISOR_BAG")]
    pub bag: Option<PathBuf>,

    /// Path to the per-node attributes file (YAML or JSON)
    #[arg(long, value_name = "PATH", env = "PROVISOR_ATTRIBUTES")]
    pub attributes: Option<PathBuf>,

    /// Write artifacts under this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
}

/// Every file artifact of a recipe as (host path, content) pairs, in step
/// order.
pub fn rendered_artifacts(recipe: &Recipe, resolver: &Resolver) -> Result<Vec<(String, String)>> {
    let mut artifacts = Vec::new();

    for step in recipe {
        match expand_step(step, resolver) {
            Step::File { file } => artifacts.push((file.path, file.content)),
            Step::EnvFile { env_file } => {
                let mut env = EnvFile::new();
                for var in &env_file.vars {
                    env.push(&var.name, &var.value);
                }
                artifacts.push((env_file.path, env.render()));
            }
            Step::Cron { cron } => {
                let mut entry = CronEntry::new(&cron.schedule, &cron.user, &cron.command);
                if let Some(comment) = &cron.comment {
                    entry = entry.comment(comment);
                }
                if let Some(log) = &cron.log {
                    entry = entry.log(log);
                }
                artifacts.push((format!("/etc/cron.d/{}", cron.name), entry.render()?));
            }
            Step::Logrotate { logrotate } => artifacts.push((
                format!("/etc/logrotate.d/{}", logrotate.name),
                LogrotateStanza::new(&logrotate.log).render(),
            )),
            // Non-file steps produce no artifact.
            _ => {}
        }
    }

    Ok(artifacts)
}

/// Execute the `render` command.
pub fn execute(args: RenderArgs) -> Result<()> {
    let resolver = load_resolver(&args.bag, &args.attributes)?;

    for path in &args.recipes {
        let recipe = config::from_file(path)?;
        let artifacts = rendered_artifacts(&recipe, &resolver)?;

        match &args.output {
            Some(output) => {
                for (host_path, content) in &artifacts {
                    let relative = host_path.trim_start_matches('/');
                    let target = output.join(relative);
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&target, content)?;
                }
                println!(
                    "✅ {} artifacts from '{}' written to {}",
                    artifacts.len(),
                    config::recipe_name(path),
                    output.display()
                );
            }
            None => {
                for (host_path, content) in &artifacts {
                    println!("--- {}", host_path);
                    print!("{}", content);
                    if !content.ends_with('\n') {
                        println!();
                    }
                }
            }
        }
    }

    Ok(())
}
