//! # Error Handling
//!
//! Centralized error handling for the `provisor` application, built on
//! `thiserror`. The `Error` enum covers every anticipated failure mode of a
//! recipe run, and each variant carries enough context (recipe path, command
//! line, exit code, variable name) to diagnose a halted run from its output
//! alone; the operator's only recovery path is to read the failure, fix the
//! host or the recipe, and re-run.
//!
//! Convergence failures are binary by design: a step either succeeds
//! (including its documented "already done" exit codes) or aborts the whole
//! recipe. There is no retry or rollback taxonomy here on purpose.

use thiserror::Error;

/// Main error type for provisor operations
#[derive(Error, Debug)]
pub enum Error {
    /// A recipe file could not be parsed into a step sequence.
    ///
    /// Includes the specific parsing issue and optionally a hint about how
    /// to fix it.
    #[error("Recipe parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    RecipeParse {
        message: String,
        /// Optional hint for how to fix the recipe
        hint: Option<String>,
    },

    /// A configuration source (data bag or node attributes) could not be
    /// loaded or was not a flat string mapping.
    #[error("Configuration source error for {path}: {message}")]
    ConfigSource { path: String, message: String },

    /// An error occurred during template interpolation.
    ///
    /// May include the name of the unresolved variable when applicable.
    #[error("Template processing error: {message}{}", variable.as_ref().map(|v| format!(" (variable: {})", v)).unwrap_or_default())]
    Template {
        message: String,
        /// The template variable that caused the error, if applicable
        variable: Option<String>,
    },

    /// A convergence command exited outside its acceptable exit-code set.
    #[error("Command failed with exit code {code}: {command}{}", if stderr.is_empty() { String::new() } else { format!("\n  stderr: {}", stderr.trim_end()) })]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// A convergence command could not be spawned at all.
    #[error("Command could not be started: {command} - {message}")]
    CommandSpawn { command: String, message: String },

    /// An error occurred while cloning or updating a Git checkout.
    #[error("Git error for {repository}@{revision}: {message}")]
    Git {
        repository: String,
        revision: String,
        message: String,
    },

    /// An error occurred while converging a file or directory resource.
    #[error("File resource error for {path}: {message}")]
    FileResource { path: String, message: String },

    /// A service control action failed.
    #[error("Service control error: {service} - {message}")]
    Service { service: String, message: String },

    /// An invalid value in a step definition (bad mode string, empty
    /// schedule, unknown action).
    #[error("Invalid step definition: {message}")]
    InvalidStep { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
