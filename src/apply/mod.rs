//! # Sequential Convergence Engine
//!
//! The applier walks a recipe's steps strictly in file order, single
//! threaded, and converges each one: install-if-absent, write-if-changed,
//! run-if-guard-fails. Each step yields an [`Outcome`]; the run aborts on
//! the first step whose command exits outside its acceptable set. There are
//! no retries and no rollback: these are one-shot host bring-up runs that
//! an operator corrects and re-runs.
//!
//! Applying the same recipe twice with unchanged configuration performs
//! zero further mutations; the e2e suite pins that invariant.

pub mod account;
pub mod execute;
pub mod file;
pub mod git;
pub mod package;
pub mod run;
pub mod service;

use crate::bag::Resolver;
use crate::config::{NotIf, Recipe, ServiceAction, Step};
use crate::error::Result;
use crate::template;
use std::path::{Path, PathBuf};

/// What a single step did to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The host already matched the desired state.
    Unchanged,
    /// The host was mutated; the string says how.
    Changed(String),
    /// Dry run: the host does not match and would be mutated.
    WouldChange(String),
    /// An idempotency guard held; the string names the guard.
    Skipped(String),
}

/// Execution context shared by all steps of a run.
#[derive(Debug, Clone)]
pub struct Context {
    /// Staging prefix rebasing every absolute artifact path. `/` converges
    /// the live host; anything else writes a tree for inspection or image
    /// builds.
    pub root: PathBuf,
    /// Report pending actions without mutating anything. Read-only guard
    /// commands are still evaluated.
    pub dry_run: bool,
}

impl Context {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self { root, dry_run }
    }

    /// Rebase an absolute host path under the staging root.
    pub fn rebase(&self, path: &str) -> PathBuf {
        let stripped = Path::new(path).strip_prefix("/").unwrap_or(Path::new(path));
        self.root.join(stripped)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/"),
            dry_run: false,
        }
    }
}

/// Per-step record of an apply run.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// 1-based position in the recipe.
    pub index: usize,
    pub kind: &'static str,
    pub subject: String,
    pub outcome: Outcome,
}

/// Full record of one recipe application.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub steps: Vec<StepReport>,
}

impl ApplyReport {
    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Changed(_)))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Unchanged))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    pub fn would_change(&self) -> usize {
        self.count(|o| matches!(o, Outcome::WouldChange(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.steps.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Applies recipes against one resolved configuration and context.
pub struct Applier<'a> {
    resolver: &'a Resolver,
    ctx: Context,
}

impl<'a> Applier<'a> {
    pub fn new(resolver: &'a Resolver, ctx: Context) -> Self {
        Self { resolver, ctx }
    }

    /// Apply a recipe start to finish, aborting on the first fatal step.
    pub fn run(&self, name: &str, recipe: &Recipe) -> Result<ApplyReport> {
        log::info!("applying recipe '{}' ({} steps)", name, recipe.len());
        let mut report = ApplyReport::default();

        for (i, step) in recipe.iter().enumerate() {
            let step = expand_step(step, self.resolver);
            let kind = step.kind();
            let subject = step.subject();
            let outcome = self.apply_step(&step)?;

            match &outcome {
                Outcome::Unchanged => log::debug!("[{}] {} {}: up to date", i + 1, kind, subject),
                Outcome::Changed(how) => log::info!("[{}] {} {}: {}", i + 1, kind, subject, how),
                Outcome::WouldChange(how) => {
                    log::info!("[{}] {} {}: would {}", i + 1, kind, subject, how)
                }
                Outcome::Skipped(guard) => {
                    log::debug!("[{}] {} {}: skipped ({})", i + 1, kind, subject, guard)
                }
            }

            report.steps.push(StepReport {
                index: i + 1,
                kind,
                subject,
                outcome,
            });
        }

        log::info!(
            "recipe '{}' converged: {} changed, {} unchanged, {} skipped",
            name,
            report.changed(),
            report.unchanged(),
            report.skipped()
        );
        Ok(report)
    }

    fn apply_step(&self, step: &Step) -> Result<Outcome> {
        match step {
            Step::Package { package } => package::converge(&self.ctx, package),
            Step::File { file } => file::converge_file(&self.ctx, file),
            Step::Directory { directory } => file::converge_directory(&self.ctx, directory),
            Step::EnvFile { env_file } => file::converge_env_file(&self.ctx, env_file),
            Step::Cron { cron } => file::converge_cron(&self.ctx, cron),
            Step::Logrotate { logrotate } => file::converge_logrotate(&self.ctx, logrotate),
            Step::Execute { execute } => execute::converge(&self.ctx, execute),
            Step::Script { script } => execute::converge_script(&self.ctx, script),
            Step::Git { git } => git::converge(&self.ctx, git),
            Step::Service { service } => service::converge(&self.ctx, service),
            Step::Group { group } => account::converge_group(&self.ctx, group),
            Step::User { user } => account::converge_user(&self.ctx, user),
        }
    }
}

/// Expand `{{ key }}` placeholders in every templated string field of a
/// step.
///
/// Lenient expansion: missing keys become empty strings, matching the
/// configuration store's contract. `validate --strict` is the place where
/// unresolved keys surface as errors.
pub fn expand_step(step: &Step, resolver: &Resolver) -> Step {
    let x = |s: &str| template::expand(s, resolver);
    let xo = |s: &Option<String>| s.as_ref().map(|v| template::expand(v, resolver));
    let xmap = |m: &std::collections::BTreeMap<String, String>| {
        m.iter().map(|(k, v)| (k.clone(), x(v))).collect()
    };

    match step.clone() {
        Step::Package { mut package } => {
            package.name = x(&package.name);
            package.version = xo(&package.version);
            package.options = xo(&package.options);
            Step::Package { package }
        }
        Step::File { mut file } => {
            file.path = x(&file.path);
            file.content = x(&file.content);
            file.owner = xo(&file.owner);
            file.group = xo(&file.group);
            Step::File { file }
        }
        Step::Directory { mut directory } => {
            directory.path = x(&directory.path);
            directory.owner = xo(&directory.owner);
            directory.group = xo(&directory.group);
            Step::Directory { directory }
        }
        Step::EnvFile { mut env_file } => {
            env_file.path = x(&env_file.path);
            env_file.owner = xo(&env_file.owner);
            for var in &mut env_file.vars {
                var.value = x(&var.value);
            }
            Step::EnvFile { env_file }
        }
        Step::Cron { mut cron } => {
            cron.name = x(&cron.name);
            cron.user = x(&cron.user);
            cron.command = x(&cron.command);
            cron.comment = xo(&cron.comment);
            cron.log = xo(&cron.log);
            Step::Cron { cron }
        }
        Step::Logrotate { mut logrotate } => {
            logrotate.name = x(&logrotate.name);
            logrotate.log = x(&logrotate.log);
            Step::Logrotate { logrotate }
        }
        Step::Execute { mut execute } => {
            execute.command = x(&execute.command);
            execute.cwd = xo(&execute.cwd);
            execute.user = xo(&execute.user);
            execute.env = xmap(&execute.env);
            execute.creates = xo(&execute.creates);
            execute.not_if = execute.not_if.map(|guard| match guard {
                NotIf::Command(cmd) => NotIf::Command(x(&cmd)),
                NotIf::OutputEquals { output_of, equals } => NotIf::OutputEquals {
                    output_of: x(&output_of),
                    equals: x(&equals),
                },
            });
            Step::Execute { execute }
        }
        Step::Script { mut script } => {
            script.code = x(&script.code);
            script.user = xo(&script.user);
            script.env = xmap(&script.env);
            Step::Script { script }
        }
        Step::Git { mut git } => {
            git.destination = x(&git.destination);
            git.repository = x(&git.repository);
            git.revision = xo(&git.revision);
            Step::Git { git }
        }
        Step::Service { mut service } => {
            service.name = x(&service.name);
            Step::Service { service }
        }
        Step::Group { mut group } => {
            group.name = x(&group.name);
            Step::Group { group }
        }
        Step::User { mut user } => {
            user.name = x(&user.name);
            user.gid = xo(&user.gid);
            user.home = xo(&user.home);
            Step::User { user }
        }
    }
}

/// Restart semantics shared by the service step and the CLI: stop first,
/// tolerating "not running", then start.
pub fn restart_sequence(action: ServiceAction) -> Vec<ServiceAction> {
    match action {
        ServiceAction::Restart => vec![ServiceAction::Stop, ServiceAction::Start],
        other => vec![other],
    }
}
