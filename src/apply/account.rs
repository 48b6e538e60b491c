//! System account convergence: the `group` and `user` steps.
//!
//! Both are guarded by `getent`, which answers "does this name exist" the
//! same way against local files and NSS-backed directories.

use crate::apply::run;
use crate::apply::{Context, Outcome};
use crate::config::{GroupStep, UserStep};
use crate::error::Result;
use std::collections::BTreeMap;

fn getent(database: &str, name: &str) -> Result<bool> {
    run::argv_succeeds(&[
        "getent".to_string(),
        database.to_string(),
        name.to_string(),
    ])
}

/// Converge a `group` step.
pub fn converge_group(ctx: &Context, step: &GroupStep) -> Result<Outcome> {
    if getent("group", &step.name)? {
        return Ok(Outcome::Unchanged);
    }
    if ctx.dry_run {
        return Ok(Outcome::WouldChange("create group".to_string()));
    }
    run::run_argv(
        &["groupadd".to_string(), step.name.clone()],
        None,
        &BTreeMap::new(),
        &[0],
    )?;
    Ok(Outcome::Changed("created".to_string()))
}

/// The `useradd` command for a user step.
pub fn useradd_argv(step: &UserStep) -> Vec<String> {
    let mut argv = vec!["useradd".to_string()];
    if let Some(gid) = &step.gid {
        argv.push("-g".to_string());
        argv.push(gid.clone());
    }
    if let Some(home) = &step.home {
        argv.push("-d".to_string());
        argv.push(home.clone());
        argv.push("-m".to_string());
    }
    argv.push(step.name.clone());
    argv
}

/// Converge a `user` step.
pub fn converge_user(ctx: &Context, step: &UserStep) -> Result<Outcome> {
    if getent("passwd", &step.name)? {
        return Ok(Outcome::Unchanged);
    }
    if ctx.dry_run {
        return Ok(Outcome::WouldChange("create user".to_string()));
    }
    run::run_argv(&useradd_argv(step), None, &BTreeMap::new(), &[0])?;
    Ok(Outcome::Changed("created".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_useradd_argv_full() {
        let step = UserStep {
            name: "ubuntu".to_string(),
            gid: Some("ubuntu".to_string()),
            home: Some("/home/ubuntu".to_string()),
        };
        assert_eq!(
            useradd_argv(&step),
            vec!["useradd", "-g", "ubuntu", "-d", "/home/ubuntu", "-m", "ubuntu"]
        );
    }

    #[test]
    fn test_useradd_argv_bare() {
        let step = UserStep {
            name: "dashboard".to_string(),
            gid: None,
            home: None,
        };
        assert_eq!(useradd_argv(&step), vec!["useradd", "dashboard"]);
    }

    #[test]
    fn test_existing_group_is_unchanged() {
        // Group 0 exists on every Linux host this runs on.
        let step = GroupStep {
            name: "root".to_string(),
        };
        let outcome = converge_group(&Context::default(), &step).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_existing_user_is_unchanged() {
        let step = UserStep {
            name: "root".to_string(),
            gid: None,
            home: None,
        };
        let outcome = converge_user(&Context::default(), &step).unwrap();
        assert_eq!(outcome, Outcome::Unchanged);
    }

    #[test]
    fn test_missing_user_dry_run() {
        let ctx = Context::new("/".into(), true);
        let step = UserStep {
            name: "no-such-user-provisor-test".to_string(),
            gid: None,
            home: None,
        };
        let outcome = converge_user(&ctx, &step).unwrap();
        assert_eq!(outcome, Outcome::WouldChange("create user".to_string()));
    }
}
