//! File-shaped convergence: plain files, directories, and the rendered
//! artifacts (env files, cron fragments, logrotate stanzas).
//!
//! Files are written wholesale, never diffed or merged at the field level.
//! The idempotency check is a byte comparison against the existing file;
//! mode drift is corrected in place, while ownership is applied only when
//! the file is (re)written.

use crate::apply::run;
use crate::apply::{Context, Outcome};
use crate::artifact::{CronEntry, EnvFile, LogrotateStanza};
use crate::config::{CronStep, DirectoryStep, EnvFileStep, FileStep, LogrotateStep};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Ensure a file exists with the given content and metadata.
pub fn converge_file(ctx: &Context, step: &FileStep) -> Result<Outcome> {
    write_if_changed(
        ctx,
        &step.path,
        &step.content,
        step.mode.as_deref(),
        step.owner.as_deref(),
        step.group.as_deref(),
    )
}

/// Ensure a directory exists with the given metadata.
pub fn converge_directory(ctx: &Context, step: &DirectoryStep) -> Result<Outcome> {
    let target = ctx.rebase(&step.path);

    if target.is_dir() {
        if let Some(mode) = step.mode.as_deref() {
            let wanted = parse_mode(mode)?;
            let current = fs::metadata(&target)?.permissions().mode() & 0o7777;
            if current != wanted {
                if ctx.dry_run {
                    return Ok(Outcome::WouldChange(format!("set mode {}", mode)));
                }
                fs::set_permissions(&target, fs::Permissions::from_mode(wanted))?;
                return Ok(Outcome::Changed(format!("mode {}", mode)));
            }
        }
        return Ok(Outcome::Unchanged);
    }

    if ctx.dry_run {
        return Ok(Outcome::WouldChange("create directory".to_string()));
    }

    fs::create_dir_all(&target).map_err(|e| Error::FileResource {
        path: step.path.clone(),
        message: e.to_string(),
    })?;
    if let Some(mode) = step.mode.as_deref() {
        fs::set_permissions(&target, fs::Permissions::from_mode(parse_mode(mode)?))?;
    }
    chown(&target, step.owner.as_deref(), step.group.as_deref())?;
    Ok(Outcome::Changed("created".to_string()))
}

/// Render and write an ordered `KEY=value` environment file.
pub fn converge_env_file(ctx: &Context, step: &EnvFileStep) -> Result<Outcome> {
    let mut env = EnvFile::new();
    for var in &step.vars {
        env.push(&var.name, &var.value);
    }
    write_if_changed(
        ctx,
        &step.path,
        &env.render(),
        step.mode.as_deref(),
        step.owner.as_deref(),
        None,
    )
}

/// Render and write a `/etc/cron.d` fragment.
pub fn converge_cron(ctx: &Context, step: &CronStep) -> Result<Outcome> {
    let mut entry = CronEntry::new(&step.schedule, &step.user, &step.command);
    if let Some(comment) = &step.comment {
        entry = entry.comment(comment);
    }
    if let Some(log) = &step.log {
        entry = entry.log(log);
    }
    let content = entry.render()?;
    let path = format!("/etc/cron.d/{}", step.name);
    write_if_changed(ctx, &path, &content, None, None, None)
}

/// Render and write a `/etc/logrotate.d` stanza.
pub fn converge_logrotate(ctx: &Context, step: &LogrotateStep) -> Result<Outcome> {
    let content = LogrotateStanza::new(&step.log).render();
    let path = format!("/etc/logrotate.d/{}", step.name);
    write_if_changed(ctx, &path, &content, None, None, None)
}

/// The shared write-if-changed primitive.
fn write_if_changed(
    ctx: &Context,
    host_path: &str,
    content: &str,
    mode: Option<&str>,
    owner: Option<&str>,
    group: Option<&str>,
) -> Result<Outcome> {
    let target = ctx.rebase(host_path);
    let wanted_mode = mode.map(parse_mode).transpose()?;

    let existing = fs::read(&target).ok();
    let content_matches = existing.as_deref() == Some(content.as_bytes());

    if content_matches {
        // Content is in place; the only drift left to correct is mode.
        if let (Some(mode), Some(wanted)) = (mode, wanted_mode) {
            let current = fs::metadata(&target)?.permissions().mode() & 0o7777;
            if current != wanted {
                if ctx.dry_run {
                    return Ok(Outcome::WouldChange(format!("set mode {}", mode)));
                }
                fs::set_permissions(&target, fs::Permissions::from_mode(wanted))?;
                return Ok(Outcome::Changed(format!("mode {}", mode)));
            }
        }
        return Ok(Outcome::Unchanged);
    }

    let how = if existing.is_some() { "updated" } else { "created" };
    if ctx.dry_run {
        return Ok(Outcome::WouldChange(format!(
            "{} ({} bytes)",
            how,
            content.len()
        )));
    }

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::FileResource {
            path: host_path.to_string(),
            message: format!("creating parent: {}", e),
        })?;
    }
    fs::write(&target, content).map_err(|e| Error::FileResource {
        path: host_path.to_string(),
        message: e.to_string(),
    })?;
    if let Some(wanted) = wanted_mode {
        fs::set_permissions(&target, fs::Permissions::from_mode(wanted))?;
    }
    chown(&target, owner, group)?;

    Ok(Outcome::Changed(format!("{} ({} bytes)", how, content.len())))
}

/// Apply ownership via `chown`, when requested.
fn chown(target: &Path, owner: Option<&str>, group: Option<&str>) -> Result<()> {
    let spec = match (owner, group) {
        (Some(owner), Some(group)) => format!("{}:{}", owner, group),
        (Some(owner), None) => owner.to_string(),
        (None, Some(group)) => format!(":{}", group),
        (None, None) => return Ok(()),
    };
    let argv = vec![
        "chown".to_string(),
        spec,
        target.to_string_lossy().to_string(),
    ];
    run::run_argv(&argv, None, &BTreeMap::new(), &[0]).map(|_| ())
}

fn parse_mode(mode: &str) -> Result<u32> {
    u32::from_str_radix(mode, 8).map_err(|_| Error::InvalidStep {
        message: format!("invalid octal mode '{}'", mode),
    })
}
