//! Apply command implementation
//!
//! The apply command runs the full convergence pipeline for each recipe in
//! turn: resolve configuration, expand templates, and drive every step to
//! its desired state. Recipes are applied in argument order, steps in file
//! order, and the first fatal step halts the whole run.

use anyhow::Result;
use clap::Args;
use provisor::apply::{Applier, Context, Outcome};
use provisor::config;
use provisor::output::{emoji, outcome_glyph, OutputConfig};
use std::path::PathBuf;
use std::time::Instant;

use crate::commands::load_resolver;

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Recipe files to apply, in order
    #[arg(value_name = "RECIPE", required = true)]
    pub recipes: Vec<PathBuf>,

    /// Path to the shared data bag (YAML or JSON)
    #[arg(long, value_name = "PATH", env = "PROVISOR_BAG")]
    pub bag: Option<PathBuf>,

    /// Path to the per-node attributes file (YAML or JSON)
    #[arg(long, value_name = "PATH", env = "PROVISOR_ATTRIBUTES")]
    pub attributes: Option<PathBuf>,

    /// Staging root; artifact paths are rebased under it ('/' converges
    /// the live host)
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub root: PathBuf,

    /// Show what would be done without making changes
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Show every step, not just the ones that changed
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Execute the apply command
pub fn execute(args: ApplyArgs, output: &OutputConfig) -> Result<()> {
    let start_time = Instant::now();

    for recipe_path in &args.recipes {
        if !recipe_path.exists() {
            anyhow::bail!("Recipe file not found: {}", recipe_path.display());
        }
    }

    if !args.quiet && args.dry_run {
        println!("{} DRY RUN MODE - No changes will be made", emoji(output, "🔎", "[dry-run]"));
        println!();
    }

    let resolver = load_resolver(&args.bag, &args.attributes)?;
    let ctx = Context::new(args.root.clone(), args.dry_run);
    let applier = Applier::new(&resolver, ctx);

    let mut total_changed = 0;
    let mut total_pending = 0;

    for recipe_path in &args.recipes {
        let name = config::recipe_name(recipe_path);
        let recipe = config::from_file(recipe_path)?;

        if !args.quiet {
            println!("{} Applying recipe '{}'", emoji(output, "📋", "[recipe]"), name);
        }

        let report = applier.run(&name, &recipe).map_err(|e| {
            if !args.quiet {
                println!("{} Recipe '{}' failed", emoji(output, "❌", "[failed]"), name);
            }
            anyhow::Error::from(e)
        })?;

        if !args.quiet {
            for step in &report.steps {
                let interesting = !matches!(step.outcome, Outcome::Unchanged);
                if args.verbose || interesting {
                    let detail = match &step.outcome {
                        Outcome::Unchanged => String::new(),
                        Outcome::Changed(how) => format!(": {}", how),
                        Outcome::WouldChange(how) => format!(": would {}", how),
                        Outcome::Skipped(guard) => format!(": {}", guard),
                    };
                    println!(
                        "   {} [{}] {} {}{}",
                        outcome_glyph(output, &step.outcome),
                        step.index,
                        step.kind,
                        step.subject,
                        detail
                    );
                }
            }
        }

        total_changed += report.changed();
        total_pending += report.would_change();
    }

    if !args.quiet {
        let duration = start_time.elapsed();
        if args.dry_run {
            println!(
                "{} {} recipes checked in {:.2}s, {} steps pending",
                emoji(output, "✅", "[done]"),
                args.recipes.len(),
                duration.as_secs_f64(),
                total_pending
            );
        } else {
            println!(
                "{} {} recipes converged in {:.2}s, {} steps changed",
                emoji(output, "✅", "[done]"),
                args.recipes.len(),
                duration.as_secs_f64(),
                total_changed
            );
        }
    }

    Ok(())
}
