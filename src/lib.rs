//! # Provisor Library
//!
//! This library provides the core functionality for converging hosts toward
//! declarative recipe state. It is used by the `provisor` command-line tool
//! but can also be embedded by other programs that need to apply
//! provisioning recipes.
//!
//! ## Quick Example
//!
//! ```
//! use provisor::apply::{Applier, Context};
//! use provisor::bag::Resolver;
//! use provisor::config;
//!
//! // Parse a recipe
//! let recipe = config::parse(r#"
//! - logrotate:
//!     name: openaddr_webhook-web-1
//!     log: /var/log/openaddr_webhook/web-1.log
//! "#).unwrap();
//! assert_eq!(recipe.len(), 1);
//!
//! // Apply it into a staging root
//! let stage = tempfile::tempdir().unwrap();
//! let resolver = Resolver::empty();
//! let ctx = Context::new(stage.path().to_path_buf(), false);
//! let report = Applier::new(&resolver, ctx).run("demo", &recipe).unwrap();
//! assert_eq!(report.changed(), 1);
//! ```
//!
//! ## Core Concepts
//!
//! - **Recipes (`config`)**: a YAML sequence of desired-state steps
//!   (packages, files, cron fragments, guarded commands, services),
//!   applied strictly in file order.
//! - **Configuration Resolution (`bag`)**: named values from a per-node
//!   attributes file and a shared data bag, bag first; missing keys
//!   resolve to empty strings.
//! - **Templates (`template`)**: `{{ key }}` interpolation of every
//!   string field in a step.
//! - **Artifacts (`artifact`)**: byte-exact builders for the recurring
//!   text shapes such as env files and cron fragments.
//! - **Convergence (`apply`)**: the sequential applier; each step is
//!   idempotent via install-if-absent, write-if-changed, or
//!   run-if-guard-fails, and any command exiting outside its acceptable
//!   set aborts the run.
//!
//! There is no parallelism, no retry, and no rollback: a halted run is
//! diagnosed from its error and re-run by the operator.

pub mod apply;
pub mod artifact;
pub mod bag;
pub mod config;
pub mod defaults;
pub mod error;
pub mod output;
pub mod template;
