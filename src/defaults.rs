//! Default paths for provisor configuration.
//!
//! Centralized so every command resolves the same bag and attributes files
//! when the flags are omitted.

use std::path::PathBuf;

/// Returns the default configuration directory.
///
/// Uses the platform config directory (`~/.config/provisor` on Linux),
/// falling back to `.provisor` in the current directory when it cannot be
/// determined. Individual files can be overridden with `--bag` and
/// `--attributes` or the `PROVISOR_BAG` / `PROVISOR_ATTRIBUTES`
/// environment variables.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("provisor"))
        .unwrap_or_else(|| PathBuf::from(".provisor"))
}

/// Default path of the shared data bag.
pub fn default_bag_path() -> PathBuf {
    default_config_dir().join("bag.yaml")
}

/// Default path of the per-node attributes file.
pub fn default_attributes_path() -> PathBuf {
    default_config_dir().join("attributes.yaml")
}
