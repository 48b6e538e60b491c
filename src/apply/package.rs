//! Package convergence against the Debian/Ubuntu package manager.
//!
//! A package step is a no-op when the requested version (or any version,
//! when unpinned) is already installed; otherwise it runs a non-interactive
//! `apt-get install`. Command construction is separated from invocation so
//! the exact command lines are testable without a package database.

use crate::apply::run;
use crate::apply::{Context, Outcome};
use crate::config::PackageStep;
use crate::error::Result;
use std::collections::BTreeMap;
use std::process::Command;

/// The query answering "is it installed, and at which version?".
pub fn query_argv(name: &str) -> Vec<String> {
    vec![
        "dpkg-query".to_string(),
        "-W".to_string(),
        "-f=${Version}".to_string(),
        name.to_string(),
    ]
}

/// The install command for a step, version pin and options included.
pub fn install_argv(step: &PackageStep) -> Vec<String> {
    let mut argv = vec![
        "apt-get".to_string(),
        "install".to_string(),
        "-y".to_string(),
    ];
    if let Some(options) = &step.options {
        for option in options.split_whitespace() {
            argv.push(option.to_string());
        }
    }
    match &step.version {
        Some(version) => argv.push(format!("{}={}", step.name, version)),
        None => argv.push(step.name.clone()),
    }
    argv
}

/// Installed version of a package, `None` when absent.
fn installed_version(name: &str) -> Result<Option<String>> {
    let argv = query_argv(name);
    log::debug!("querying: {}", argv.join(" "));
    let output = Command::new(&argv[0])
        .args(&argv[1..])
        .output()
        .map_err(|e| crate::error::Error::CommandSpawn {
            command: argv.join(" "),
            message: e.to_string(),
        })?;
    if !output.status.success() {
        return Ok(None);
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    // dpkg-query exits 0 for known-but-removed packages with empty version.
    if version.is_empty() {
        Ok(None)
    } else {
        Ok(Some(version))
    }
}

/// Converge a `package` step.
pub fn converge(ctx: &Context, step: &PackageStep) -> Result<Outcome> {
    let installed = installed_version(&step.name)?;

    let satisfied = match (&installed, &step.version) {
        (Some(_), None) => true,
        (Some(installed), Some(wanted)) => installed == wanted,
        (None, _) => false,
    };
    if satisfied {
        return Ok(Outcome::Unchanged);
    }

    let wanted = step.version.as_deref().unwrap_or("latest");
    if ctx.dry_run {
        return Ok(Outcome::WouldChange(format!("install {}", wanted)));
    }

    run::run_argv(&install_argv(step), None, &BTreeMap::new(), &[0])?;
    Ok(Outcome::Changed(format!("installed {}", wanted)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str, version: Option<&str>, options: Option<&str>) -> PackageStep {
        PackageStep {
            name: name.to_string(),
            version: version.map(|v| v.to_string()),
            options: options.map(|o| o.to_string()),
        }
    }

    #[test]
    fn test_query_argv() {
        assert_eq!(
            query_argv("postgresql-9.3"),
            vec!["dpkg-query", "-W", "-f=${Version}", "postgresql-9.3"]
        );
    }

    #[test]
    fn test_install_argv_unpinned() {
        assert_eq!(
            install_argv(&step("apache2", None, None)),
            vec!["apt-get", "install", "-y", "apache2"]
        );
    }

    #[test]
    fn test_install_argv_pinned() {
        assert_eq!(
            install_argv(&step("libsfcgal1", Some("1.2.2-1~trusty2"), None)),
            vec!["apt-get", "install", "-y", "libsfcgal1=1.2.2-1~trusty2"]
        );
    }

    #[test]
    fn test_install_argv_with_options() {
        assert_eq!(
            install_argv(&step(
                "postgresql-9.3-postgis-scripts",
                Some("2.2.2+dfsg-2~trusty0"),
                Some("--force-yes"),
            )),
            vec![
                "apt-get",
                "install",
                "-y",
                "--force-yes",
                "postgresql-9.3-postgis-scripts=2.2.2+dfsg-2~trusty0"
            ]
        );
    }
}
