//! Redirect entries: a globbed source paired with an unresolved destination.
use crate::tree::Node;
use crate::vpath::VPath;

use super::glob::{expand_tilde, parse_glob_line};

/// One `source ::: destination` rule after the source has been globbed.
///
/// The destination stays a raw pattern because it can only be matched once
/// the destination root of the run is known.
#[derive(Debug, Clone)]
pub struct RedirectEntry {
    source: Node,
    destination: String,
}

impl RedirectEntry {
    /// Pair a resolved source with a destination pattern.
    #[must_use]
    pub fn new(source: Node, destination: impl Into<String>) -> Self {
        Self {
            source,
            destination: destination.into(),
        }
    }

    /// The resolved source node.
    #[must_use]
    pub const fn source(&self) -> &Node {
        &self.source
    }

    /// The destination pattern as written in the rule file.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Directories, in destination coordinates, that should receive the
    /// source.
    ///
    /// The pattern is globbed against `target_root`; when nothing matches it
    /// is taken literally.  A match whose last component is the source's own
    /// name denotes the link itself, so its parent receives the source;
    /// any other match is the receiving directory.  Matches that are
    /// existing non-directories under another name cannot receive anything
    /// and are dropped.
    #[must_use]
    pub fn resolve(&self, target_root: &VPath) -> Vec<VPath> {
        let matches: Vec<VPath> = match parse_glob_line(target_root, &self.destination) {
            Ok(nodes) => nodes.into_iter().map(|n| n.path().clone()).collect(),
            Err(e) => {
                tracing::error!("invalid redirect destination {}: {e}", self.destination);
                return Vec::new();
            }
        };
        let matches = if matches.is_empty() {
            vec![target_root.join(expand_tilde(&self.destination))]
        } else {
            matches
        };

        matches
            .into_iter()
            .filter_map(|candidate| self.receiving_dir(candidate))
            .collect()
    }

    fn receiving_dir(&self, candidate: VPath) -> Option<VPath> {
        if candidate.name() == self.source.name() {
            return candidate.parent();
        }
        if candidate.exists() && !candidate.as_path().is_dir() {
            tracing::warn!(
                "cannot redirect {} into {candidate}: not a directory",
                self.source.path()
            );
            return None;
        }
        Some(candidate)
    }
}
