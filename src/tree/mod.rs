//! The virtual tree: an in-memory mirror of a directory hierarchy.
//!
//! Every mutation here happens in memory only.  A [`Tree`] is populated once
//! from disk with [`Tree::traverse`], reshaped by the trim and move
//! operations, and finally handed to [`link::realize`] which is the only
//! place that writes to the filesystem.
//!
//! All recursive operations take a `depth` budget.  A depth of `0` limits the
//! operation to the current level; [`DEFAULT_DEPTH`] is effectively
//! unbounded for real directory trees.
pub mod link;
pub mod render;

use std::ffi::OsStr;
use std::fs;
use std::hash::{Hash, Hasher};

use crate::error::{StowError, StowconfigError, TreeError};
use crate::stowconfig::condition::RuleContext;
use crate::stowconfig::redirect::RedirectEntry;
use crate::stowconfig::{STOWCONFIG_FILE_NAME, Stowconfig};
use crate::vpath::VPath;

/// Depth budget used when an operation should cover the whole tree.
pub const DEFAULT_DEPTH: usize = 1024;

/// One element of a [`Tree`].
#[derive(Debug, Clone)]
pub enum Node {
    /// A file, symlink or any other non-directory entry.
    Leaf(VPath),
    /// A directory with its own children.
    Branch(Tree),
}

impl Node {
    /// Classify `path`: real directories become empty branches, everything
    /// else (symlinks to directories included) becomes a leaf.
    #[must_use]
    pub fn from_path(path: VPath) -> Self {
        if path.is_real_dir() {
            Self::Branch(Tree::new(path))
        } else {
            Self::Leaf(path)
        }
    }

    /// Like [`Node::from_path`], but branches are traversed from disk.
    #[must_use]
    pub fn populated(path: VPath) -> Self {
        match Self::from_path(path) {
            Self::Branch(tree) => Self::Branch(tree.traversed()),
            leaf @ Self::Leaf(_) => leaf,
        }
    }

    /// Path of the element.
    #[must_use]
    pub const fn path(&self) -> &VPath {
        match self {
            Self::Leaf(path) => path,
            Self::Branch(tree) => &tree.path,
        }
    }

    /// Final path component of the element.
    #[must_use]
    pub fn name(&self) -> &OsStr {
        self.path().name()
    }
}

impl From<VPath> for Node {
    fn from(path: VPath) -> Self {
        Self::from_path(path)
    }
}

impl From<Tree> for Node {
    fn from(tree: Tree) -> Self {
        Self::Branch(tree)
    }
}

/// A directory node of the virtual tree.
///
/// Identity is the absolute path: two trees compare equal when their paths
/// do, whatever their contents.  A tree may be virtual, meaning its path
/// does not exist yet; such trees are created while resolving redirects
/// and materialize as directories during realization.
#[derive(Debug, Clone)]
pub struct Tree {
    path: VPath,
    children: Vec<Node>,
    stowconfig: Option<Stowconfig>,
    redirected: bool,
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Tree {}

impl Hash for Tree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl Tree {
    /// An empty tree rooted at `path`.
    #[must_use]
    pub const fn new(path: VPath) -> Self {
        Self {
            path,
            children: Vec::new(),
            stowconfig: None,
            redirected: false,
        }
    }

    /// Absolute path of the directory.
    #[must_use]
    pub const fn path(&self) -> &VPath {
        &self.path
    }

    /// Final path component of the directory.
    #[must_use]
    pub fn name(&self) -> &OsStr {
        self.path.name()
    }

    /// The rule file discovered in this directory, if any.
    #[must_use]
    pub const fn stowconfig(&self) -> Option<&Stowconfig> {
        self.stowconfig.as_ref()
    }

    /// Direct children in no particular order.
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Direct leaf children.
    pub fn contents(&self) -> impl Iterator<Item = &VPath> {
        self.children.iter().filter_map(|node| match node {
            Node::Leaf(path) => Some(path),
            Node::Branch(_) => None,
        })
    }

    /// Direct branch children.
    pub fn branches(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|node| match node {
            Node::Branch(tree) => Some(tree),
            Node::Leaf(_) => None,
        })
    }

    /// Direct branch children, mutably.
    pub fn branches_mut(&mut self) -> impl Iterator<Item = &mut Self> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Branch(tree) => Some(tree),
            Node::Leaf(_) => None,
        })
    }

    /// Insert `node` as a direct child.
    ///
    /// An element with the same path is replaced; when both are branches
    /// their children are merged instead.
    pub fn push(&mut self, node: Node) {
        let Some(slot) = self.children.iter_mut().find(|c| c.path() == node.path()) else {
            self.children.push(node);
            return;
        };
        match (slot, node) {
            (Node::Branch(existing), Node::Branch(incoming)) => {
                for child in incoming.children {
                    existing.push(child);
                }
            }
            (slot, node) => *slot = node,
        }
    }

    /// Recursive element count: direct children plus the count of every
    /// branch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len() + self.branches().map(Self::len).sum::<usize>()
    }

    /// Whether the tree has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Whether `path` logically belongs under this tree.
    #[must_use]
    pub fn contains(&self, path: &VPath) -> bool {
        self.path.contains(path)
    }

    /// Populate the tree from disk, replacing any existing children.
    ///
    /// Symlinks are never followed.  The `.stowconfig` file fills the rule
    /// file slot instead of becoming a leaf.  A directory that cannot be
    /// listed leaves the tree unchanged.
    pub fn traverse(&mut self) {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("cannot list {}: {e}", self.path);
                return;
            }
        };

        self.children.clear();
        self.stowconfig = None;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("cannot read entry in {}: {e}", self.path);
                    continue;
                }
            };
            let path = VPath::new(entry.path());
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.children.push(Node::Branch(Self::new(path).traversed()));
            } else if path.name() == STOWCONFIG_FILE_NAME {
                self.stowconfig = Some(Stowconfig::new(path));
            } else {
                self.children.push(Node::Leaf(path));
            }
        }
    }

    /// Builder form of [`Tree::traverse`].
    #[must_use]
    pub fn traversed(mut self) -> Self {
        self.traverse();
        self
    }

    /// Remove the leaf at `target`, searching branches up to `depth` levels
    /// down.  Trimming the rule file's path clears the rule file slot.
    ///
    /// Returns the removed element, or `None` when `target` is not present.
    pub fn trim_path(&mut self, target: &VPath, depth: usize) -> Option<Node> {
        if self.stowconfig.as_ref().is_some_and(|s| s.path() == target) {
            self.stowconfig = None;
            return Some(Node::Leaf(target.clone()));
        }
        if let Some(idx) = self
            .children
            .iter()
            .position(|c| matches!(c, Node::Leaf(p) if p == target))
        {
            return Some(self.children.remove(idx));
        }
        let depth = depth.checked_sub(1)?;
        self.branches_mut().find_map(|b| b.trim_path(target, depth))
    }

    /// Remove the branch at `target`, searching branches up to `depth`
    /// levels down.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::TrimSelf`] if `target` is this tree.
    pub fn trim_branch(&mut self, target: &VPath, depth: usize) -> Result<Option<Node>, TreeError> {
        if *target == self.path {
            return Err(TreeError::TrimSelf {
                path: self.path.as_path().to_path_buf(),
            });
        }
        if let Some(idx) = self
            .children
            .iter()
            .position(|c| matches!(c, Node::Branch(t) if t.path == *target))
        {
            return Ok(Some(self.children.remove(idx)));
        }
        let Some(depth) = depth.checked_sub(1) else {
            return Ok(None);
        };
        for branch in self.branches_mut() {
            if let Some(node) = branch.trim_branch(target, depth)? {
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// Remove `thing`, dispatching to [`Tree::trim_branch`] for directories
    /// and [`Tree::trim_path`] for everything else.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::TrimSelf`] if `thing` is this tree.
    pub fn trim_content(&mut self, thing: impl Into<Node>, depth: usize) -> Result<Option<Node>, TreeError> {
        match thing.into() {
            Node::Leaf(path) => Ok(self.trim_path(&path, depth)),
            Node::Branch(tree) => self.trim_branch(&tree.path, depth),
        }
    }

    /// Remove every leaf for which `rule(leaf, depth)` holds, deepest
    /// levels first.
    pub fn trim_by_leaf_rule<F>(&mut self, rule: &F, depth: usize)
    where
        F: Fn(&VPath, usize) -> bool,
    {
        if let Some(next) = depth.checked_sub(1) {
            for branch in self.branches_mut() {
                branch.trim_by_leaf_rule(rule, next);
            }
        }
        self.children
            .retain(|c| !matches!(c, Node::Leaf(p) if rule(p, depth)));
    }

    /// Remove every branch for which `rule(branch, depth)` holds, deepest
    /// levels first, so a branch emptied by the rule can be removed by it
    /// too.
    pub fn trim_by_branch_rule<F>(&mut self, rule: &F, depth: usize)
    where
        F: Fn(&Self, usize) -> bool,
    {
        if let Some(next) = depth.checked_sub(1) {
            for branch in self.branches_mut() {
                branch.trim_by_branch_rule(rule, next);
            }
        }
        self.children
            .retain(|c| !matches!(c, Node::Branch(t) if rule(t, depth)));
    }

    /// Apply every rule file's `[ignore]` section, starting the search for
    /// each ignorable at the tree that owns the rule file.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule file fails to parse and integrity is
    /// enforced.
    pub fn trim_ignored(&mut self, ctx: &RuleContext, depth: usize) -> Result<(), StowconfigError> {
        let ignorables: Vec<VPath> = match &self.stowconfig {
            Some(cfg) => cfg.ignorables(ctx)?.iter().cloned().collect(),
            None => Vec::new(),
        };
        for ignorable in &ignorables {
            if self.trim_path(ignorable, depth).is_some() {
                tracing::debug!("ignored {ignorable}");
            }
        }

        if let Some(depth) = depth.checked_sub(1) {
            for branch in self.branches_mut() {
                branch.trim_ignored(ctx, depth)?;
            }
        }
        Ok(())
    }

    /// Apply every rule file's `[redirect]` section.
    ///
    /// `target` is the real directory this tree will be linked into.  Each
    /// redirected source is cut from the tree and re-inserted under the
    /// virtual directory that mirrors its resolved destination.
    ///
    /// # Errors
    ///
    /// Returns an error if a rule file fails to parse and integrity is
    /// enforced, or if a redirect names the directory owning it.
    pub fn move_redirected(&mut self, target: &VPath, ctx: &RuleContext, depth: usize) -> Result<(), StowError> {
        if !self.redirected {
            self.redirected = true;
            let entries: Vec<RedirectEntry> = match &self.stowconfig {
                Some(cfg) => cfg.redirectables(ctx)?.to_vec(),
                None => Vec::new(),
            };
            for entry in &entries {
                self.apply_redirect(entry, target, depth)?;
            }
        }

        if let Some(depth) = depth.checked_sub(1) {
            for branch in self.branches_mut() {
                let sub_target = target.join(branch.name());
                branch.move_redirected(&sub_target, ctx, depth)?;
            }
        }
        Ok(())
    }

    fn apply_redirect(&mut self, entry: &RedirectEntry, target: &VPath, depth: usize) -> Result<(), TreeError> {
        let destinations: Vec<VPath> = entry
            .resolve(target)
            .into_iter()
            .map(|dst| dst.redirect(target, &self.path))
            .filter(|dst| {
                let inside = self.contains(dst);
                if !inside {
                    tracing::warn!(
                        "cannot redirect {} to {dst}: outside of {}",
                        entry.source().path(),
                        self.path
                    );
                }
                inside
            })
            .collect();
        if destinations.is_empty() {
            return Ok(());
        }

        let source = entry.source().path();
        let node = match self.trim_content(entry.source().clone(), depth)? {
            Some(removed) => removed,
            None => Node::populated(source.clone()),
        };
        let mut placed = false;
        for destination in &destinations {
            if self.touch(node.clone(), destination) {
                tracing::debug!("redirected {source} into {destination}");
                placed = true;
            }
        }
        if !placed {
            tracing::error!("could not redirect {source}, keeping it in place");
            if let Some(home) = source.parent() {
                self.touch(node, &home);
            }
        }
        Ok(())
    }

    /// Insert `node` into the (possibly virtual) directory `destination`,
    /// creating intermediate virtual trees as needed.
    ///
    /// Descending towards `destination` is not limited by a depth budget.
    /// Returns `false`, after logging a warning, when `destination` lies
    /// outside this tree or cannot hold children.
    pub fn touch(&mut self, node: Node, destination: &VPath) -> bool {
        if !self.contains(destination) {
            tracing::warn!("refusing to place {} in {destination}: outside of {}", node.path(), self.path);
            return false;
        }
        if self.path == *destination {
            self.push(node);
            return true;
        }
        if let Some(branch) = self.branches_mut().find(|b| b.contains(destination)) {
            return branch.touch(node, destination);
        }
        let Some(step) = self.path.next_component(destination) else {
            tracing::warn!("cannot place {} in {destination}: not a directory", node.path());
            return false;
        };
        if self.contents().any(|leaf| *leaf == step) {
            tracing::warn!("cannot place {} in {destination}: {step} is not a directory", node.path());
            return false;
        }

        let mut intermediate = Self::new(step);
        let placed = intermediate.touch(node, destination);
        if placed {
            self.children.push(Node::Branch(intermediate));
        }
        placed
    }
}
