//! Symlink-farm manager with per-directory rule files.
//!
//! `pstow` mirrors a source directory into a target directory as symbolic
//! links.  Each source directory may carry a `.stowconfig` file that ignores
//! entries, redirects them elsewhere in the target, or does either only when
//! a package is installed or a profile is active.
//!
//! The public API is organised into layers:
//!
//! - **[`vpath`]**: absolute normalized paths and their containment algebra
//! - **[`tree`]**: the in-memory virtual tree, its trims, rendering and linking
//! - **[`stowconfig`]**: the `.stowconfig` rule language
//! - **[`stower`]**: the end-to-end pipeline
//! - **[`commands`]**: command-line handlers on top of [`cli`] and [`config`]
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod prompt;
pub mod stowconfig;
pub mod stower;
pub mod tree;
pub mod vpath;
