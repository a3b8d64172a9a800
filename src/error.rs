//! Domain-specific error types for the stow engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Core modules return typed errors (e.g., [`TreeError`], [`StowconfigError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! StowError
//! ├── SameSourceAndDestination: precondition checked before traversal
//! ├── InvalidTarget           : destination root is missing or not a directory
//! ├── Tree(TreeError)         : misuse of the virtual tree
//! └── Stowconfig(StowconfigError): rule file failures under enforce-integrity
//! ```
//!
//! A negative confirmation answer is **not** an error: it is reported as
//! [`StowOutcome::Aborted`](crate::stower::StowOutcome::Aborted).

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a stow run.
#[derive(Error, Debug)]
pub enum StowError {
    /// Source and destination resolve to the same directory.
    #[error("source cannot be the same as destination: {}", path.display())]
    SameSourceAndDestination {
        /// The shared path.
        path: PathBuf,
    },

    /// The destination root cannot receive links.
    #[error("invalid target {}: {reason}", path.display())]
    InvalidTarget {
        /// Destination root that was rejected.
        path: PathBuf,
        /// Why the destination was rejected.
        reason: String,
    },

    /// Virtual tree operation error.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Rule file error escalated by the enforce-integrity strategy.
    #[error("stowconfig error: {0}")]
    Stowconfig(#[from] StowconfigError),
}

/// Errors raised by virtual tree operations.
///
/// These indicate a caller bug rather than a filesystem condition.
#[derive(Error, Debug)]
pub enum TreeError {
    /// A tree was asked to trim itself from its own children.
    #[error("cannot trim tree {} from itself", path.display())]
    TrimSelf {
        /// Path of the tree.
        path: PathBuf,
    },
}

/// Errors that arise while evaluating a `.stowconfig` rule file.
#[derive(Error, Debug)]
pub enum StowconfigError {
    /// The rule file (or a directory it references) could not be read.
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A conditional block was opened but never closed with `[end]`.
    #[error("unterminated block {header} in {}", path.display())]
    UnterminatedBlock {
        /// Rule file containing the block.
        path: PathBuf,
        /// Header line that opened the block.
        header: String,
    },

    /// The rule file failed to parse and integrity is enforced.
    #[error("integrity of {} violated: {reason}", path.display())]
    Integrity {
        /// Rule file that failed.
        path: PathBuf,
        /// Description of the original failure.
        reason: String,
    },
}
