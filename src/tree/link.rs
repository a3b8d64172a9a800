//! Realization: turning a virtual tree into symlinks on disk.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};

use super::Tree;
use crate::logging::Log;
use crate::vpath::VPath;

/// Mode used for directories that have no real counterpart in the source.
#[cfg(unix)]
const DEFAULT_DIR_MODE: u32 = 0o755;

/// Knobs for [`realize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOptions {
    /// Create missing parent directories of a link.
    pub make_parents: bool,
    /// Log every decision without touching the filesystem.
    pub dry_run: bool,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            make_parents: true,
            dry_run: false,
        }
    }
}

/// Per-run tally of link decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Links created (or that would be created in a dry run).
    pub linked: usize,
    /// Destinations that already pointed at the right source.
    pub already_linked: usize,
    /// Destinations refused by the policy or unable to hold links.
    pub skipped: usize,
    /// Links that could not be created.
    pub failed: usize,
}

impl LinkReport {
    fn absorb(&mut self, other: Self) {
        self.linked += other.linked;
        self.already_linked += other.already_linked;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} linked, {} already linked, {} skipped, {} failed",
            self.linked, self.already_linked, self.skipped, self.failed
        )
    }
}

/// Outcome of a single leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkAction {
    Linked,
    AlreadyLinked,
    Skipped,
    Failed,
}

/// Link every leaf of `tree` into `target`, recursing into branches.
///
/// `policy` decides per destination whether a link may be (re)placed there.
/// Every decision is reported to `log`; in a dry run the would-be links go
/// to [`Log::dry_run`]. Failures are counted and never stop the remaining
/// links.
pub fn realize<P>(tree: &Tree, target: &VPath, policy: &P, options: LinkOptions, log: &dyn Log) -> LinkReport
where
    P: Fn(&VPath) -> bool,
{
    let mut report = LinkReport::default();
    for leaf in tree.contents() {
        let destination = target.join(leaf.name());
        match link_leaf(tree, leaf, &destination, policy, options, log) {
            LinkAction::Linked => report.linked += 1,
            LinkAction::AlreadyLinked => report.already_linked += 1,
            LinkAction::Skipped => report.skipped += 1,
            LinkAction::Failed => report.failed += 1,
        }
    }

    for branch in tree.branches() {
        let sub_target = target.join(branch.name());
        if sub_target.exists() && !sub_target.as_path().is_dir() {
            log.warn(&format!("skipping {sub_target}: exists and is not a directory"));
            report.skipped += 1;
            continue;
        }
        report.absorb(realize(branch, &sub_target, policy, options, log));
    }
    report
}

fn link_leaf<P>(
    tree: &Tree,
    leaf: &VPath,
    destination: &VPath,
    policy: &P,
    options: LinkOptions,
    log: &dyn Log,
) -> LinkAction
where
    P: Fn(&VPath) -> bool,
{
    let source = link_source(leaf);
    if points_to(destination, &source) {
        log.debug(&format!("already linked: {destination}"));
        return LinkAction::AlreadyLinked;
    }
    if !policy(destination) {
        log.warn(&format!("skipping {destination}: already exists"));
        return LinkAction::Skipped;
    }
    if options.dry_run {
        log.dry_run(&format!("would link {destination} -> {}", source.display()));
        return LinkAction::Linked;
    }

    match place_link(&source, destination, tree.path(), options.make_parents) {
        Ok(()) => {
            log.info(&format!("linked {destination} -> {}", source.display()));
            LinkAction::Linked
        }
        Err(e) => {
            log.error(&format!("cannot link {destination}: {e:#}"));
            LinkAction::Failed
        }
    }
}

fn points_to(destination: &VPath, source: &Path) -> bool {
    std::fs::read_link(destination).is_ok_and(|existing| existing == source)
}

fn place_link(source: &Path, destination: &VPath, template: &VPath, make_parents: bool) -> Result<()> {
    if let Some(parent) = destination.parent()
        && !parent.exists()
    {
        if !make_parents {
            bail!("parent directory {parent} does not exist");
        }
        create_parent(parent.as_path(), template.as_path())?;
    }
    remove_existing(destination)?;
    create_symlink(source, destination.as_path())
}

/// Create `dir` and any missing ancestors.
///
/// Only `dir` itself takes the permissions of `template` (when that is a real
/// directory); ancestors get the process defaults.
fn create_parent(dir: &Path, #[cfg_attr(not(unix), allow(unused_variables))] template: &Path) -> Result<()> {
    if let Some(ancestors) = dir.parent() {
        std::fs::create_dir_all(ancestors).with_context(|| format!("create directory: {}", ancestors.display()))?;
    }

    #[cfg(unix)]
    let created = {
        use std::os::unix::fs::{DirBuilderExt as _, PermissionsExt as _};

        let mode = std::fs::metadata(template)
            .ok()
            .filter(std::fs::Metadata::is_dir)
            .map_or(DEFAULT_DIR_MODE, |m| m.permissions().mode() & 0o7777);
        std::fs::DirBuilder::new().mode(mode).create(dir)
    };

    #[cfg(not(unix))]
    let created = std::fs::create_dir(dir);

    created.with_context(|| format!("create directory: {}", dir.display()))
}

/// Remove the entry at `path` so a link can take its place.  Real
/// directories are never removed.
fn remove_existing(path: &VPath) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if path.is_real_dir() {
        bail!("refusing to replace directory {path}");
    }
    let meta = std::fs::symlink_metadata(path).with_context(|| format!("reading metadata: {path}"))?;
    if cfg!(windows) && meta.is_symlink() && path.as_path().is_dir() {
        std::fs::remove_dir(path).with_context(|| format!("remove existing: {path}"))
    } else {
        std::fs::remove_file(path).with_context(|| format!("remove existing: {path}"))
    }
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let result = if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    };

    result.with_context(|| format!("creating symlink {} -> {}", link.display(), target.display()))
}

/// Canonical path a leaf is linked to; dangling entries keep their own path.
fn link_source(leaf: &VPath) -> PathBuf {
    dunce::canonicalize(leaf).unwrap_or_else(|_| leaf.as_path().to_path_buf())
}
