//! Git checkout convergence.
//!
//! Uses the system `git` binary, which picks up SSH keys, credential
//! helpers, and tokens from the operator's environment. A destination
//! without a checkout is cloned; an existing checkout is fetched and moved
//! only when its `HEAD` does not already resolve to the requested revision.

use crate::apply::{Context, Outcome};
use crate::config::GitStep;
use crate::error::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Converge a `git` step.
pub fn converge(ctx: &Context, step: &GitStep) -> Result<Outcome> {
    let dest = ctx.rebase(&step.destination);

    if !dest.join(".git").is_dir() {
        if ctx.dry_run {
            return Ok(Outcome::WouldChange(format!("clone {}", step.repository)));
        }
        clone(step, &dest)?;
        return Ok(Outcome::Changed(format!(
            "cloned at {}",
            step.revision.as_deref().unwrap_or("default branch")
        )));
    }

    let revision = match &step.revision {
        Some(revision) => revision,
        // No pinned revision: an existing checkout is already converged.
        None => return Ok(Outcome::Unchanged),
    };

    if head_matches(&dest, revision) {
        return Ok(Outcome::Unchanged);
    }

    if ctx.dry_run {
        return Ok(Outcome::WouldChange(format!("checkout {}", revision)));
    }

    git(step, &dest, &["fetch", "--tags", "origin"])?;
    git(step, &dest, &["checkout", revision])?;
    Ok(Outcome::Changed(format!("checked out {}", revision)))
}

fn clone(step: &GitStep, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let output = Command::new("git")
        .arg("clone")
        .arg(&step.repository)
        .arg(dest)
        .output()
        .map_err(|e| git_error(step, e.to_string()))?;
    if !output.status.success() {
        return Err(git_error(
            step,
            String::from_utf8_lossy(&output.stderr).to_string(),
        ));
    }

    if let Some(revision) = &step.revision {
        git(step, dest, &["checkout", revision])?;
    }
    Ok(())
}

/// Whether `HEAD` already resolves to the requested revision.
///
/// Unresolvable revisions (an unfetched tag, a new branch) report false and
/// fall through to fetch + checkout.
fn head_matches(dest: &Path, revision: &str) -> bool {
    let head = rev_parse(dest, "HEAD");
    let wanted = rev_parse(dest, &format!("{}^{{commit}}", revision));
    match (head, wanted) {
        (Some(head), Some(wanted)) => head == wanted,
        _ => false,
    }
}

fn rev_parse(dest: &Path, rev: &str) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dest)
        .args(["rev-parse", "--verify", rev])
        .output()
        .ok()?;
    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}

fn git(step: &GitStep, dest: &Path, args: &[&str]) -> Result<()> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dest)
        .args(args)
        .output()
        .map_err(|e| git_error(step, e.to_string()))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(git_error(
            step,
            String::from_utf8_lossy(&output.stderr).to_string(),
        ))
    }
}

fn git_error(step: &GitStep, message: String) -> Error {
    Error::Git {
        repository: step.repository.clone(),
        revision: step
            .revision
            .clone()
            .unwrap_or_else(|| "HEAD".to_string()),
        message,
    }
}
