//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand: parse recipes, check
//! that every cron schedule renders, and (with `--strict`) require every
//! referenced template variable to be present in the configuration
//! sources. Nothing on the host is touched.
//!
//! Validation accumulates failures across all given recipes instead of
//! stopping at the first one, so a whole `recipes/` tree can be fixed in
//! one pass.

use anyhow::Result;
use clap::Args;
use provisor::apply::expand_step;
use provisor::artifact::CronEntry;
use provisor::config::{self, Step};
use provisor::template;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::commands::load_resolver;

/// Validate recipe structure and template variables
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Recipe files to validate
    #[arg(value_name = "RECIPE")]
    pub recipes: Vec<PathBuf>,

    /// Validate every .yaml/.yml recipe under this directory
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Path to the shared data bag (YAML or JSON)
    #[arg(long, value_name = "PATH", env = "PROVISOR_BAG")]
    pub bag: Option<PathBuf>,

    /// Path to the per-node attributes file (YAML or JSON)
    #[arg(long, value_name = "PATH", env = "PROVISOR_ATTRIBUTES")]
    pub attributes: Option<PathBuf>,

    /// Fail on template variables missing from both sources
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs) -> Result<()> {
    let mut paths = args.recipes.clone();
    if let Some(dir) = &args.dir {
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let is_recipe = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if is_recipe {
                paths.push(entry.path().to_path_buf());
            }
        }
    }
    if paths.is_empty() {
        anyhow::bail!("No recipes given; pass recipe files or --dir");
    }

    let resolver = load_resolver(&args.bag, &args.attributes)?;
    let mut failures = 0usize;

    for path in &paths {
        match validate_one(path, &resolver, args.strict) {
            Ok(steps) => println!("✅ {} ({} steps)", path.display(), steps),
            Err(e) => {
                failures += 1;
                println!("❌ {}: {}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} recipes failed validation", failures, paths.len());
    }
    Ok(())
}

fn validate_one(
    path: &PathBuf,
    resolver: &provisor::bag::Resolver,
    strict: bool,
) -> Result<usize> {
    let raw = std::fs::read_to_string(path)?;
    let recipe = config::parse(&raw)?;

    if strict {
        template::expand_strict(&raw, resolver)?;
    }

    for step in &recipe {
        if let Step::Cron { cron } = expand_step(step, resolver) {
            CronEntry::new(&cron.schedule, &cron.user, &cron.command).render()?;
        }
    }

    Ok(recipe.len())
}
