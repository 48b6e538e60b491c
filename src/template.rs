//! # Template Interpolation
//!
//! Recipes embed configuration values in their string fields as
//! `{{ key }}` placeholders. Interpolation is a single regex-driven pass:
//! placeholders never nest and expanded values are not re-scanned, so a
//! Slack URL containing braces cannot smuggle a second expansion.
//!
//! The lenient mode mirrors the configuration store's contract: unknown
//! keys expand to the empty string. The strict mode reports the first
//! unresolved key instead and backs `validate --strict`.

use crate::bag::Resolver;
use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("static regex"))
}

/// Expand `{{ key }}` placeholders; unknown keys become the empty string.
pub fn expand(input: &str, resolver: &Resolver) -> String {
    placeholder_re()
        .replace_all(input, |caps: &regex::Captures<'_>| {
            resolver.resolve(&caps[1])
        })
        .into_owned()
}

/// Expand placeholders, failing on the first key absent from both sources.
pub fn expand_strict(input: &str, resolver: &Resolver) -> Result<String> {
    for caps in placeholder_re().captures_iter(input) {
        let key = &caps[1];
        if !resolver.contains(key) {
            return Err(Error::Template {
                message: "unresolved variable".to_string(),
                variable: Some(key.to_string()),
            });
        }
    }
    Ok(expand(input, resolver))
}

/// List the distinct placeholder keys referenced by a template.
pub fn referenced_keys(input: &str) -> Vec<String> {
    let mut keys: Vec<String> = placeholder_re()
        .captures_iter(input)
        .map(|caps| caps[1].to_string())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}
