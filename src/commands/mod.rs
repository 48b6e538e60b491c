//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `provisor` command-line tool. Each subcommand lives in its own file.
//!
//! ## Structure
//!
//! Each command module contains:
//! - An `Args` struct that defines the command-specific arguments and
//!   options, derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and performs the
//!   command's logic, calling into the `provisor` library.

pub mod apply;
pub mod check;
pub mod completions;
pub mod ls;
pub mod render;
pub mod validate;

use anyhow::Result;
use provisor::bag::{self, Resolver, Values};
use provisor::defaults;
use provisor::output::OutputConfig;
use std::path::PathBuf;

/// Build the output configuration from the global `--color` flag.
pub fn output_config(color_flag: &str) -> OutputConfig {
    OutputConfig::from_env_and_flag(color_flag)
}

/// Load the resolver from the bag and attributes flags.
///
/// An explicitly given path must load; the default paths are optional, so
/// a host with no configuration at all still resolves (to empty strings).
pub fn load_resolver(
    bag_path: &Option<PathBuf>,
    attributes_path: &Option<PathBuf>,
) -> Result<Resolver> {
    let bag = load_source(bag_path, defaults::default_bag_path())?;
    let attributes = load_source(attributes_path, defaults::default_attributes_path())?;
    Ok(Resolver::new(bag, attributes))
}

fn load_source(explicit: &Option<PathBuf>, default: PathBuf) -> Result<Values> {
    match explicit {
        Some(path) => Ok(bag::load_values(path)?),
        None => {
            if default.exists() {
                Ok(bag::load_values(&default)?)
            } else {
                Ok(Values::new())
            }
        }
    }
}
