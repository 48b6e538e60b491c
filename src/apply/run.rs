//! Process invocation helpers shared by the convergence steps.
//!
//! Every external command a step runs goes through here, so the
//! exit-code contract is enforced in one place: a command "succeeds" when
//! its exit code is in the step's acceptable set, and anything else aborts
//! the recipe with the captured stderr attached.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

/// Exit code reported when a process was terminated by a signal and has no
/// real exit code to compare against an acceptable set.
const SIGNALED: i32 = -1;

/// Build the argv for a shell command line, optionally wrapped in
/// `sudo -u <user>`.
pub fn shell_argv(command: &str, user: Option<&str>) -> Vec<String> {
    let mut argv = Vec::new();
    if let Some(user) = user {
        argv.push("sudo".to_string());
        argv.push("-u".to_string());
        argv.push(user.to_string());
    }
    argv.push("sh".to_string());
    argv.push("-c".to_string());
    argv.push(command.to_string());
    argv
}

/// Build the argv for a multi-line script run through `bash`.
pub fn script_argv(code: &str, flags: Option<&str>, user: Option<&str>) -> Vec<String> {
    let mut argv = Vec::new();
    if let Some(user) = user {
        argv.push("sudo".to_string());
        argv.push("-u".to_string());
        argv.push(user.to_string());
    }
    argv.push("bash".to_string());
    if let Some(flags) = flags {
        for flag in flags.split_whitespace() {
            argv.push(flag.to_string());
        }
    }
    argv.push("-c".to_string());
    argv.push(code.to_string());
    argv
}

/// Run an argv, requiring the exit code to be in `returns`.
///
/// Returns the observed exit code on success so callers can distinguish
/// "done" (0) from "already done" (a documented non-zero code).
pub fn run_argv(
    argv: &[String],
    cwd: Option<&Path>,
    env: &BTreeMap<String, String>,
    returns: &[i32],
) -> Result<i32> {
    let display = argv.join(" ");
    log::debug!("running: {}", display);

    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    for (key, value) in env {
        command.env(key, value);
    }

    let output = command.output().map_err(|e| Error::CommandSpawn {
        command: display.clone(),
        message: e.to_string(),
    })?;

    let code = output.status.code().unwrap_or(SIGNALED);
    if returns.contains(&code) {
        Ok(code)
    } else {
        Err(Error::CommandFailed {
            command: display,
            code,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Run an argv and report only whether it exited 0.
///
/// Used for guard and query commands, where a non-zero exit is an answer,
/// not a failure.
pub fn argv_succeeds(argv: &[String]) -> Result<bool> {
    let display = argv.join(" ");
    log::debug!("probing: {}", display);

    let mut command = Command::new(&argv[0]);
    command.args(&argv[1..]);
    let output = command.output().map_err(|e| Error::CommandSpawn {
        command: display,
        message: e.to_string(),
    })?;
    Ok(output.status.success())
}

/// Run a shell command line and capture its trimmed stdout, regardless of
/// exit code. Version probes like `tippecanoe -v` exit non-zero on some
/// builds while still printing the version.
pub fn shell_output(command: &str) -> Result<String> {
    log::debug!("capturing: {}", command);
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|e| Error::CommandSpawn {
            command: command.to_string(),
            message: e.to_string(),
        })?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_argv_plain() {
        assert_eq!(
            shell_argv("a2ensite worker", None),
            vec!["sh", "-c", "a2ensite worker"]
        );
    }

    #[test]
    fn test_shell_argv_with_user() {
        assert_eq!(
            shell_argv("psql -c 'CREATE USER dashboard'", Some("postgres")),
            vec!["sudo", "-u", "postgres", "sh", "-c", "psql -c 'CREATE USER dashboard'"]
        );
    }

    #[test]
    fn test_script_argv_with_flags() {
        assert_eq!(
            script_argv("echo one\necho two\n", Some("-e"), None),
            vec!["bash", "-e", "-c", "echo one\necho two\n"]
        );
    }

    #[test]
    fn test_run_argv_accepts_listed_code() {
        let argv = shell_argv("exit 1", None);
        let code = run_argv(&argv, None, &BTreeMap::new(), &[0, 1]).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_run_argv_rejects_unlisted_code() {
        let argv = shell_argv("exit 3", None);
        let err = run_argv(&argv, None, &BTreeMap::new(), &[0, 1]).unwrap_err();
        match err {
            Error::CommandFailed { code, .. } => assert_eq!(code, 3),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_run_argv_passes_env() {
        let argv = shell_argv("test \"$PREFIX\" = /usr/local", None);
        let mut env = BTreeMap::new();
        env.insert("PREFIX".to_string(), "/usr/local".to_string());
        assert_eq!(run_argv(&argv, None, &env, &[0]).unwrap(), 0);
    }

    #[test]
    fn test_argv_succeeds() {
        assert!(argv_succeeds(&shell_argv("true", None)).unwrap());
        assert!(!argv_succeeds(&shell_argv("false", None)).unwrap());
    }

    #[test]
    fn test_shell_output_trims() {
        assert_eq!(shell_output("echo ' v1.15.1 '").unwrap(), "v1.15.1");
    }

    #[test]
    fn test_shell_output_ignores_exit_code() {
        assert_eq!(shell_output("echo v1.15.1; exit 2").unwrap(), "v1.15.1");
    }

    #[test]
    fn test_run_argv_spawn_failure() {
        let argv = vec!["/nonexistent/binary".to_string()];
        let err = run_argv(&argv, None, &BTreeMap::new(), &[0]).unwrap_err();
        assert!(matches!(err, Error::CommandSpawn { .. }));
    }
}
