//! # Ls Command Implementation
//!
//! Lists the steps of a recipe in apply order: index, kind, subject, and
//! any idempotency guard. Read-only.

use anyhow::Result;
use clap::Args;
use provisor::config::{self, NotIf, Step};
use std::path::PathBuf;

/// List the steps of a recipe in order
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Recipe files to list
    #[arg(value_name = "RECIPE", required = true)]
    pub recipes: Vec<PathBuf>,
}

/// Execute the `ls` command.
pub fn execute(args: LsArgs) -> Result<()> {
    for path in &args.recipes {
        let recipe = config::from_file(path)?;
        println!("{}:", config::recipe_name(path));

        for (i, step) in recipe.iter().enumerate() {
            let guard = guard_note(step);
            println!("  {:>3}. {:<10} {}{}", i + 1, step.kind(), step.subject(), guard);
        }
        println!();
    }
    Ok(())
}

fn guard_note(step: &Step) -> String {
    let Step::Execute { execute } = step else {
        return String::new();
    };
    let mut notes = Vec::new();
    if let Some(creates) = &execute.creates {
        notes.push(format!("creates {}", creates));
    }
    match &execute.not_if {
        Some(NotIf::Command(cmd)) => notes.push(format!("not_if '{}'", cmd)),
        Some(NotIf::OutputEquals { equals, .. }) => notes.push(format!("unless at {}", equals)),
        None => {}
    }
    if execute.returns != vec![0] {
        notes.push(format!("returns {:?}", execute.returns));
    }
    if notes.is_empty() {
        String::new()
    } else {
        format!("  [{}]", notes.join(", "))
    }
}
