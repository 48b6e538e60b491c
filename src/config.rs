//! # Recipe Schema and Parsing
//!
//! This module defines the data structures that represent a recipe file, as
//! well as the logic for parsing it. A recipe is a YAML sequence of *steps*,
//! executed strictly in file order; each step declares a desired state for
//! one system resource (a package, a file, a command's side effect, a
//! service) plus the idempotency guard that decides whether the step still
//! needs to run.
//!
//! ## Key Components
//!
//! - **`Recipe`**: a type alias for `Vec<Step>`, the whole file as an ordered
//!   step sequence.
//!
//! - **`Step`**: an enum covering every step kind a recipe may contain:
//!   `package`, `file`, `directory`, `env_file`, `cron`, `logrotate`,
//!   `execute`, `script`, `git`, `service`, `group`, and `user`.
//!
//! - **Step structs**: each variant has a corresponding struct (e.g.
//!   `PackageStep`, `ExecuteStep`) holding its specific parameters.
//!
//! Every string field is subject to `{{ key }}` template interpolation
//! against the resolved configuration before the step is applied; the schema
//! itself stores the raw templated text.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Package step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageStep {
    /// Package name as known to the platform package manager.
    pub name: String,
    /// Optional exact version pin (e.g. `2.2.2+dfsg-2~trusty0`).
    #[serde(default)]
    pub version: Option<String>,
    /// Extra options passed through to the install command
    /// (e.g. `--force-yes`).
    #[serde(default)]
    pub options: Option<String>,
}

/// File step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStep {
    /// Absolute target path on the host.
    pub path: String,
    /// Full file content, written wholesale (no diffing or merging).
    pub content: String,
    /// Octal mode string (e.g. `"0755"`).
    #[serde(default)]
    pub mode: Option<String>,
    /// Owning user, applied with `chown` when present.
    #[serde(default)]
    pub owner: Option<String>,
    /// Owning group.
    #[serde(default)]
    pub group: Option<String>,
}

/// Directory step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryStep {
    /// Absolute directory path; parents are created as needed.
    pub path: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
}

/// A single environment variable in an `env_file` step.
///
/// Declared as a list rather than a mapping so that the rendered file
/// preserves the recipe's declaration order exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Environment-file step configuration
///
/// Renders `KEY=value` lines, one per declared var, in order, for
/// consumption by downstream process managers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvFileStep {
    pub path: String,
    pub vars: Vec<EnvVar>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Cron step configuration
///
/// Renders a `/etc/cron.d/<name>` fragment: `PATH` header, optional comment,
/// then the five-field schedule, the user, and the command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CronStep {
    /// Fragment name under `/etc/cron.d/`.
    pub name: String,
    /// Five-field cron schedule (e.g. `0 5 */2 * *`).
    pub schedule: String,
    /// User the command runs as.
    pub user: String,
    /// Shell command line.
    pub command: String,
    /// Optional comment rendered above the schedule line.
    #[serde(default)]
    pub comment: Option<String>,
    /// Optional log file; when set the command is suffixed with
    /// `>> <log> 2>&1`.
    #[serde(default)]
    pub log: Option<String>,
}

/// Logrotate step configuration
///
/// Renders a `/etc/logrotate.d/<name>` stanza with the fleet's fixed
/// rotation policy (weekly, 4 generations, compressed, copytruncate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogrotateStep {
    /// Stanza name under `/etc/logrotate.d/`.
    pub name: String,
    /// Path of the rotated log file.
    pub log: String,
}

/// Idempotency guard for `execute` steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotIf {
    /// Skip the step when this shell command exits 0.
    Command(String),
    /// Skip the step when the (trimmed) stdout of `output_of` equals
    /// `equals`. Used for version guards on build-from-source steps.
    OutputEquals { output_of: String, equals: String },
}

/// Execute step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteStep {
    /// Shell command line, run via `sh -c`.
    pub command: String,
    /// Working directory for the command.
    #[serde(default)]
    pub cwd: Option<String>,
    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Run as this user (via `sudo -u`) instead of the invoking user.
    #[serde(default)]
    pub user: Option<String>,
    /// Acceptable exit codes; anything else is fatal to the recipe.
    #[serde(default = "default_returns")]
    pub returns: Vec<i32>,
    /// Skip when the guard holds.
    #[serde(default)]
    pub not_if: Option<NotIf>,
    /// Skip when this path already exists.
    #[serde(default)]
    pub creates: Option<String>,
}

/// Script step configuration
///
/// Multi-line shell code handed to `bash` on stdin, with optional
/// interpreter flags (`-e` to stop at the first failing line).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Shell code, typically a heredoc-style block.
    pub code: String,
    /// Interpreter flags (e.g. `-e`).
    #[serde(default)]
    pub flags: Option<String>,
    /// Run as this user.
    #[serde(default)]
    pub user: Option<String>,
    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Acceptable exit codes.
    #[serde(default = "default_returns")]
    pub returns: Vec<i32>,
}

/// Git step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitStep {
    /// Checkout destination on the host.
    pub destination: String,
    /// Repository URL.
    pub repository: String,
    /// Branch, tag, or commit to check out; the remote default branch when
    /// omitted.
    #[serde(default)]
    pub revision: Option<String>,
}

/// Service actions supported by the `service` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Start,
    Stop,
    /// Stop (tolerating "not running") then start.
    Restart,
    Reload,
}

/// Service step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStep {
    /// Init job name (e.g. `openaddr_webhook`).
    pub name: String,
    pub action: ServiceAction,
}

/// Group step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStep {
    pub name: String,
}

/// User step configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStep {
    pub name: String,
    /// Primary group name.
    #[serde(default)]
    pub gid: Option<String>,
    /// Home directory; created by `useradd -m` when present.
    #[serde(default)]
    pub home: Option<String>,
}

/// All possible step kinds in a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    /// Ensure a package is installed, optionally at a pinned version.
    Package { package: PackageStep },
    /// Write a file wholesale with optional mode/owner metadata.
    File { file: FileStep },
    /// Ensure a directory exists with optional mode/owner metadata.
    Directory { directory: DirectoryStep },
    /// Render an ordered `KEY=value` environment file.
    EnvFile { env_file: EnvFileStep },
    /// Render a `/etc/cron.d` fragment.
    Cron { cron: CronStep },
    /// Render a `/etc/logrotate.d` stanza with the fixed policy.
    Logrotate { logrotate: LogrotateStep },
    /// Run a guarded shell command.
    Execute { execute: ExecuteStep },
    /// Run a multi-line shell script.
    Script { script: ScriptStep },
    /// Ensure a Git checkout exists at a revision.
    Git { git: GitStep },
    /// Control a long-running init job.
    Service { service: ServiceStep },
    /// Ensure a system group exists.
    Group { group: GroupStep },
    /// Ensure a system user exists.
    User { user: UserStep },
}

impl Step {
    /// Short kind name for listings and summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Package { .. } => "package",
            Step::File { .. } => "file",
            Step::Directory { .. } => "directory",
            Step::EnvFile { .. } => "env_file",
            Step::Cron { .. } => "cron",
            Step::Logrotate { .. } => "logrotate",
            Step::Execute { .. } => "execute",
            Step::Script { .. } => "script",
            Step::Git { .. } => "git",
            Step::Service { .. } => "service",
            Step::Group { .. } => "group",
            Step::User { .. } => "user",
        }
    }

    /// One-line human description of the step's subject.
    pub fn subject(&self) -> String {
        match self {
            Step::Package { package } => package.name.clone(),
            Step::File { file } => file.path.clone(),
            Step::Directory { directory } => directory.path.clone(),
            Step::EnvFile { env_file } => env_file.path.clone(),
            Step::Cron { cron } => format!("/etc/cron.d/{}", cron.name),
            Step::Logrotate { logrotate } => format!("/etc/logrotate.d/{}", logrotate.name),
            Step::Execute { execute } => execute.command.clone(),
            Step::Script { .. } => "script".to_string(),
            Step::Git { git } => git.destination.clone(),
            Step::Service { service } => service.name.clone(),
            Step::Group { group } => group.name.clone(),
            Step::User { user } => user.name.clone(),
        }
    }
}

/// The complete recipe, represented as an ordered list of steps.
///
/// Steps are applied strictly in the order they appear in the file.
pub type Recipe = Vec<Step>;

/// Default acceptable exit codes for commands: success only.
pub fn default_returns() -> Vec<i32> {
    vec![0]
}

/// Parse a YAML string into a `Recipe`.
pub fn parse(yaml: &str) -> Result<Recipe> {
    // An empty document is an empty recipe, not a parse error.
    if yaml.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_yaml::from_str::<Recipe>(yaml).map_err(|e| Error::RecipeParse {
        message: e.to_string(),
        hint: Some(
            "each list item must be one of: package, file, directory, env_file, \
             cron, logrotate, execute, script, git, service, group, user"
                .to_string(),
        ),
    })
}

/// Load and parse a recipe from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Recipe> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::RecipeParse {
        message: format!("cannot read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content)
}

/// Derive a recipe's display name from its file path (file stem).
pub fn recipe_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_recipe() {
        let recipe = parse("").unwrap();
        assert!(recipe.is_empty());
    }

    #[test]
    fn test_parse_package_steps() {
        let yaml = r#"
- package:
    name: postgresql-9.3
- package:
    name: postgresql-9.3-postgis-scripts
    version: "2.2.2+dfsg-2~trusty0"
    options: "--force-yes"
"#;
        let recipe = parse(yaml).unwrap();
        assert_eq!(recipe.len(), 2);
        match &recipe[0] {
            Step::Package { package } => {
                assert_eq!(package.name, "postgresql-9.3");
                assert!(package.version.is_none());
            }
            other => panic!("expected package step, got {}", other.kind()),
        }
        match &recipe[1] {
            Step::Package { package } => {
                assert_eq!(package.version.as_deref(), Some("2.2.2+dfsg-2~trusty0"));
                assert_eq!(package.options.as_deref(), Some("--force-yes"));
            }
            other => panic!("expected package step, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_file_step_with_mode() {
        let yaml = r#"
- file:
    path: /etc/init.d/openaddr-worker
    mode: "0755"
    content: |
      #! /bin/sh
      echo worker
"#;
        let recipe = parse(yaml).unwrap();
        match &recipe[0] {
            Step::File { file } => {
                assert_eq!(file.path, "/etc/init.d/openaddr-worker");
                assert_eq!(file.mode.as_deref(), Some("0755"));
                assert!(file.content.starts_with("#! /bin/sh"));
            }
            other => panic!("expected file step, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_execute_with_guards() {
        let yaml = r#"
- execute:
    command: make install
    cwd: /tmp/tippecanoe
    env:
      PREFIX: /usr/local
    not_if:
      output_of: "tippecanoe -v 2>&1 | cut -d' ' -f 2"
      equals: v1.15.1
- execute:
    command: "curl -s http://nodejs.org/dist/node.tar.gz | tar -C /usr -xzf -"
    not_if: which node
- execute:
    command: stop openaddr_webhook
    returns: [0, 1]
"#;
        let recipe = parse(yaml).unwrap();
        assert_eq!(recipe.len(), 3);
        match &recipe[0] {
            Step::Execute { execute } => {
                assert_eq!(execute.env.get("PREFIX").unwrap(), "/usr/local");
                match execute.not_if.as_ref().unwrap() {
                    NotIf::OutputEquals { equals, .. } => assert_eq!(equals, "v1.15.1"),
                    NotIf::Command(_) => panic!("expected output_of guard"),
                }
                assert_eq!(execute.returns, vec![0]);
            }
            other => panic!("expected execute step, got {}", other.kind()),
        }
        match &recipe[1] {
            Step::Execute { execute } => match execute.not_if.as_ref().unwrap() {
                NotIf::Command(cmd) => assert_eq!(cmd, "which node"),
                NotIf::OutputEquals { .. } => panic!("expected command guard"),
            },
            other => panic!("expected execute step, got {}", other.kind()),
        }
        match &recipe[2] {
            Step::Execute { execute } => assert_eq!(execute.returns, vec![0, 1]),
            other => panic!("expected execute step, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_env_file_preserves_order() {
        let yaml = r#"
- env_file:
    path: /etc/openaddr-collector.conf
    vars:
      - name: DATABASE_URL
        value: "{{ database_url }}"
      - name: AWS_ACCESS_KEY_ID
        value: "{{ aws_access_id }}"
      - name: GITHUB_TOKEN
        value: "{{ github_token }}"
"#;
        let recipe = parse(yaml).unwrap();
        match &recipe[0] {
            Step::EnvFile { env_file } => {
                let names: Vec<&str> = env_file.vars.iter().map(|v| v.name.as_str()).collect();
                assert_eq!(
                    names,
                    vec!["DATABASE_URL", "AWS_ACCESS_KEY_ID", "GITHUB_TOKEN"]
                );
            }
            other => panic!("expected env_file step, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_cron_and_logrotate() {
        let yaml = r#"
- logrotate:
    name: openaddr_crontab-dotmap
    log: /var/log/openaddr_crontab/dotmap.log
- cron:
    name: openaddr_crontab-cleanup-tempdir
    schedule: "0 0 * * *"
    user: "{{ username }}"
    comment: Clean up week-old contents of /tmp
    command: find /tmp -depth -user {{ username }} -mtime +7 -delete
"#;
        let recipe = parse(yaml).unwrap();
        assert_eq!(recipe[0].kind(), "logrotate");
        assert_eq!(recipe[1].kind(), "cron");
        assert_eq!(
            recipe[1].subject(),
            "/etc/cron.d/openaddr_crontab-cleanup-tempdir"
        );
    }

    #[test]
    fn test_parse_service_actions() {
        let yaml = r#"
- service:
    name: openaddr_webhook
    action: restart
"#;
        let recipe = parse(yaml).unwrap();
        match &recipe[0] {
            Step::Service { service } => {
                assert_eq!(service.action, ServiceAction::Restart);
            }
            other => panic!("expected service step, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_git_step() {
        let yaml = r#"
- git:
    destination: /tmp/tippecanoe
    repository: https://github.com/mapbox/tippecanoe.git
    revision: "1.15.1"
"#;
        let recipe = parse(yaml).unwrap();
        match &recipe[0] {
            Step::Git { git } => {
                assert_eq!(git.destination, "/tmp/tippecanoe");
                assert_eq!(git.revision.as_deref(), Some("1.15.1"));
            }
            other => panic!("expected git step, got {}", other.kind()),
        }
    }

    #[test]
    fn test_parse_account_steps() {
        let yaml = r#"
- group:
    name: "{{ username }}"
- user:
    name: "{{ username }}"
    gid: "{{ username }}"
    home: "/home/{{ username }}"
"#;
        let recipe = parse(yaml).unwrap();
        assert_eq!(recipe[0].kind(), "group");
        assert_eq!(recipe[1].kind(), "user");
    }

    #[test]
    fn test_parse_invalid_step_has_hint() {
        let yaml = "- bogus:\n    name: nope\n";
        let err = parse(yaml).unwrap_err();
        let display = format!("{}", err);
        assert!(display.contains("Recipe parsing error"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = from_file("/nonexistent/recipe.yaml").unwrap_err();
        assert!(format!("{}", err).contains("cannot read"));
    }

    #[test]
    fn test_recipe_name_from_path() {
        assert_eq!(recipe_name(Path::new("recipes/crontab.yaml")), "crontab");
    }
}
