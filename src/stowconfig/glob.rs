//! Glob expansion for rule-file patterns.
use std::fs;
use std::io;
use std::path::Path;

use glob::{MatchOptions, Pattern, PatternError};

use crate::tree::Node;
use crate::vpath::VPath;

/// Shell-like matching: `*` stops at `/` and does not match a leading dot,
/// `**` spans directories.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Expand `pattern` relative to `parent` and classify every match.
///
/// Directories (not symlinks to directories) become untraversed
/// [`Node::Branch`] values, everything else [`Node::Leaf`].  An absolute
/// pattern, or one starting with `~/`, ignores `parent`.
///
/// # Errors
///
/// Returns an error if the pattern is not a valid glob.
pub fn parse_glob_line(parent: &VPath, pattern: &str) -> Result<Vec<Node>, PatternError> {
    let pattern = expand_tilde(pattern);
    let full = if Path::new(&pattern).is_absolute() {
        pattern
    } else {
        let escaped = Pattern::escape(&parent.as_path().to_string_lossy());
        format!("{}/{pattern}", escaped.trim_end_matches('/'))
    };

    let mut matches: Vec<Node> = glob::glob_with(&full, MATCH_OPTIONS)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(Node::from_path(VPath::new(path))),
            Err(e) => {
                tracing::debug!("unreadable glob entry for {full}: {e}");
                None
            }
        })
        .collect();
    matches.dedup_by(|a, b| a.path() == b.path());
    Ok(matches)
}

/// Replace a leading `~` with the value of `$HOME`.
#[must_use]
pub fn expand_tilde(pattern: &str) -> String {
    let Ok(home) = std::env::var("HOME") else {
        return pattern.to_string();
    };
    if pattern == "~" {
        return home;
    }
    pattern
        .strip_prefix("~/")
        .map_or_else(|| pattern.to_string(), |rest| format!("{}/{rest}", home.trim_end_matches('/')))
}

/// Collect every non-directory entry at or below `node`.
///
/// Symlinks are reported as entries and never followed, which mirrors how
/// the tree itself is traversed.
///
/// # Errors
///
/// Returns an error if a directory cannot be listed.
pub fn flatten(node: &Node) -> io::Result<Vec<VPath>> {
    match node {
        Node::Leaf(path) => Ok(vec![path.clone()]),
        Node::Branch(tree) => flatten_dir(tree.path()),
    }
}

fn flatten_dir(dir: &VPath) -> io::Result<Vec<VPath>> {
    let mut leaves = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = VPath::new(entry.path());
        if entry.file_type()?.is_dir() {
            leaves.extend(flatten_dir(&path)?);
        } else {
            leaves.push(path);
        }
    }
    Ok(leaves)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, VPath) {
        let tmp = tempfile::tempdir().unwrap();
        let root = VPath::new(dunce::canonicalize(tmp.path()).unwrap());
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("b.txt"), "b").unwrap();
        fs::write(root.join(".hidden"), "h").unwrap();
        fs::create_dir_all(root.join("sub/deep")).unwrap();
        fs::write(root.join("sub/c.txt"), "c").unwrap();
        fs::write(root.join("sub/deep/d.txt"), "d").unwrap();
        (tmp, root)
    }

    fn names(nodes: &[Node]) -> Vec<String> {
        let mut names: Vec<String> = nodes
            .iter()
            .map(|n| n.name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn literal_pattern_matches_one_file() {
        let (_tmp, root) = scratch();
        let nodes = parse_glob_line(&root, "a.txt").unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], Node::Leaf(p) if *p == root.join("a.txt")));
    }

    #[test]
    fn directories_become_branches() {
        let (_tmp, root) = scratch();
        let nodes = parse_glob_line(&root, "sub").unwrap();
        assert!(matches!(&nodes[0], Node::Branch(t) if *t.path() == root.join("sub")));
    }

    #[test]
    fn star_skips_dotfiles() {
        let (_tmp, root) = scratch();
        let nodes = parse_glob_line(&root, "*").unwrap();
        assert_eq!(names(&nodes), vec!["a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn double_star_recurses() {
        let (_tmp, root) = scratch();
        let nodes = parse_glob_line(&root, "**/*.txt").unwrap();
        assert_eq!(names(&nodes), vec!["a.txt", "b.txt", "c.txt", "d.txt"]);
    }

    #[test]
    fn no_match_is_empty() {
        let (_tmp, root) = scratch();
        assert!(parse_glob_line(&root, "missing*").unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let (_tmp, root) = scratch();
        assert!(parse_glob_line(&root, "[").is_err());
    }

    #[test]
    fn flatten_lists_nested_leaves() {
        let (_tmp, root) = scratch();
        let mut leaves = flatten(&Node::from_path(root.join("sub"))).unwrap();
        leaves.sort();
        assert_eq!(leaves, vec![root.join("sub/c.txt"), root.join("sub/deep/d.txt")]);
    }

    #[test]
    fn flatten_of_leaf_is_itself() {
        let (_tmp, root) = scratch();
        let leaf = root.join("a.txt");
        assert_eq!(flatten(&Node::Leaf(leaf.clone())).unwrap(), vec![leaf]);
    }

    #[test]
    fn tilde_expands_only_at_start() {
        let Ok(home) = std::env::var("HOME") else {
            return;
        };
        assert_eq!(expand_tilde("~"), home);
        assert!(expand_tilde("~/x").ends_with("/x"));
        assert_eq!(expand_tilde("a/~/x"), "a/~/x");
    }
}
