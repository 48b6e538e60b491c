//! Init-job control: the `service` step.
//!
//! The fleet's long-running processes are upstart jobs exported by the
//! process manager, controlled with bare `stop`/`start` commands. Stopping
//! tolerates exit 1: "unknown instance" just means the job was not
//! running, which is the desired half of a restart.

use crate::apply::run;
use crate::apply::{restart_sequence, Context, Outcome};
use crate::config::{ServiceAction, ServiceStep};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// The command line for one service action.
pub fn action_argv(name: &str, action: ServiceAction) -> Vec<String> {
    match action {
        ServiceAction::Start => vec!["start".to_string(), name.to_string()],
        ServiceAction::Stop => vec!["stop".to_string(), name.to_string()],
        ServiceAction::Reload => vec![
            "service".to_string(),
            name.to_string(),
            "reload".to_string(),
        ],
        // Restart is a sequence, not a single command.
        ServiceAction::Restart => unreachable!("restart expands to stop + start"),
    }
}

/// Exit codes accepted for an action.
fn acceptable(action: ServiceAction) -> &'static [i32] {
    match action {
        ServiceAction::Stop => &[0, 1],
        _ => &[0],
    }
}

/// Converge a `service` step.
pub fn converge(ctx: &Context, step: &ServiceStep) -> Result<Outcome> {
    if ctx.dry_run {
        return Ok(Outcome::WouldChange(format!("{:?}", step.action).to_lowercase()));
    }

    for action in restart_sequence(step.action) {
        let argv = action_argv(&step.name, action);
        run::run_argv(&argv, None, &BTreeMap::new(), acceptable(action)).map_err(|e| {
            match e {
                Error::CommandFailed { command, code, stderr } => Error::Service {
                    service: step.name.clone(),
                    message: format!("'{}' exited {}: {}", command, code, stderr.trim_end()),
                },
                other => other,
            }
        })?;
    }

    Ok(Outcome::Changed(format!("{:?}", step.action).to_lowercase()))
}
