//! Guarded command execution: the `execute` and `script` steps.
//!
//! A command step converges by *running*; its idempotence is only as good
//! as its guard. Three guard forms cover the corpus: `creates` (skip when a
//! path exists), `not_if` with a command (skip when it exits 0), and
//! `not_if` with an output/equals pair (skip when a version probe already
//! reports the target version).

use crate::apply::run;
use crate::apply::{Context, Outcome};
use crate::config::{ExecuteStep, NotIf, ScriptStep};
use crate::error::Result;
use std::path::Path;

/// Converge an `execute` step.
pub fn converge(ctx: &Context, step: &ExecuteStep) -> Result<Outcome> {
    if let Some(reason) = guard_skip(ctx, step.creates.as_deref(), step.not_if.as_ref())? {
        return Ok(Outcome::Skipped(reason));
    }
    if ctx.dry_run {
        return Ok(Outcome::WouldChange(format!("run: {}", step.command)));
    }

    let argv = run::shell_argv(&step.command, step.user.as_deref());
    let code = run::run_argv(
        &argv,
        step.cwd.as_deref().map(Path::new),
        &step.env,
        &step.returns,
    )?;
    Ok(Outcome::Changed(run_description(code)))
}

/// Converge a `script` step.
pub fn converge_script(ctx: &Context, step: &ScriptStep) -> Result<Outcome> {
    if ctx.dry_run {
        return Ok(Outcome::WouldChange("run script".to_string()));
    }

    let argv = run::script_argv(&step.code, step.flags.as_deref(), step.user.as_deref());
    let code = run::run_argv(&argv, None, &step.env, &step.returns)?;
    Ok(Outcome::Changed(run_description(code)))
}

fn run_description(code: i32) -> String {
    if code == 0 {
        "ran (exit 0)".to_string()
    } else {
        // A non-zero code in the acceptable set means "already converged"
        // by the step's own contract.
        format!("ran (exit {}, accepted)", code)
    }
}

/// Evaluate the step's guards; `Some(reason)` means skip.
///
/// Guards run even in dry-run mode; they are read-only probes, and
/// without them a dry run would report every guarded step as pending.
fn guard_skip(
    ctx: &Context,
    creates: Option<&str>,
    not_if: Option<&NotIf>,
) -> Result<Option<String>> {
    if let Some(creates) = creates {
        if ctx.rebase(creates).exists() {
            return Ok(Some(format!("creates: {} exists", creates)));
        }
    }

    match not_if {
        Some(NotIf::Command(command)) => {
            if run::argv_succeeds(&run::shell_argv(command, None))? {
                return Ok(Some(format!("not_if: '{}' succeeded", command)));
            }
        }
        Some(NotIf::OutputEquals { output_of, equals }) => {
            if run::shell_output(output_of)? == *equals {
                return Ok(Some(format!("not_if: already at {}", equals)));
            }
        }
        None => {}
    }

    Ok(None)
}
