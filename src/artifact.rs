//! # Rendered Artifact Builders
//!
//! The fleet's recipes write the same few text shapes over and over: ordered
//! `KEY=value` environment files for process managers, `/etc/cron.d`
//! fragments, and `/etc/logrotate.d` stanzas with one fixed rotation policy.
//! These builders produce those shapes byte-for-byte, so every recipe that
//! needs one renders identical text and the write-if-changed check in the
//! applier stays meaningful across re-runs.

use crate::error::{Error, Result};

/// Fixed rotation policy shared by every log the fleet rotates:
/// weekly, four generations, compressed, copytruncate.
const ROTATION_POLICY: &str = "{\n\
\tcopytruncate\n\
\trotate 4\n\
\tweekly\n\
\tmissingok\n\
\tnotifempty\n\
\tcompress\n\
\tdelaycompress\n\
\tendscript\n\
}\n";

/// `PATH` header written at the top of every cron fragment.
const CRON_PATH: &str = "PATH=/usr/local/sbin:/usr/local/bin:/sbin:/bin:/usr/sbin:/usr/bin";

/// An ordered `KEY=value` environment file.
///
/// Downstream process managers read these line by line; order follows the
/// recipe's declaration order exactly, with no key omitted or reordered.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    pairs: Vec<(String, String)>,
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable. Duplicate names are kept; the later line wins in
    /// every consumer the fleet runs.
    pub fn push(&mut self, name: &str, value: &str) {
        self.pairs.push((name.to_string(), value.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Render to `KEY=value` lines with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.pairs {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

/// A `/etc/logrotate.d` stanza for one log file, using the fixed policy.
#[derive(Debug, Clone)]
pub struct LogrotateStanza {
    log_path: String,
}

impl LogrotateStanza {
    pub fn new(log_path: &str) -> Self {
        Self {
            log_path: log_path.to_string(),
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n{}\n", self.log_path, ROTATION_POLICY)
    }
}

/// A `/etc/cron.d` fragment: `PATH` header, optional comment, then the
/// tab-separated schedule/user/command line.
#[derive(Debug, Clone)]
pub struct CronEntry {
    schedule: String,
    user: String,
    command: String,
    comment: Option<String>,
    log: Option<String>,
}

impl CronEntry {
    pub fn new(schedule: &str, user: &str, command: &str) -> Self {
        Self {
            schedule: schedule.to_string(),
            user: user.to_string(),
            command: command.to_string(),
            comment: None,
            log: None,
        }
    }

    /// Comment line rendered above the schedule.
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Append `>> <log> 2>&1` to the (parenthesized) command.
    pub fn log(mut self, log: &str) -> Self {
        self.log = Some(log.to_string());
        self
    }

    /// Render the fragment.
    ///
    /// Fails when the schedule is not exactly five fields; cron silently
    /// ignores malformed fragments, so this is the only place the mistake
    /// can surface.
    pub fn render(&self) -> Result<String> {
        let fields: Vec<&str> = self.schedule.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(Error::InvalidStep {
                message: format!(
                    "cron schedule must have exactly 5 fields, got {} in '{}'",
                    fields.len(),
                    self.schedule
                ),
            });
        }

        let command = match &self.log {
            Some(log) => format!("( {} ) >> {} 2>&1", self.command, log),
            None => self.command.clone(),
        };

        let mut out = String::new();
        out.push_str(CRON_PATH);
        out.push_str("\n\n");
        if let Some(comment) = &self.comment {
            out.push_str("# ");
            out.push_str(comment);
            out.push('\n');
        }
        // Minute and hour, then the date fields, then user and command,
        // tab-separated the way the original fragments were laid out.
        out.push_str(&format!(
            "{} {}\t{} {} {}\t{}\t{}\n",
            fields[0], fields[1], fields[2], fields[3], fields[4], self.user, command
        ));
        Ok(out)
    }
}
