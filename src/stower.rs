//! The stow pipeline: build, redirect, exclude, ignore, prune, confirm, link.
use crate::error::StowError;
use crate::logging::Log;
use crate::prompt::Confirm;
use crate::stowconfig::condition::RuleContext;
use crate::tree::link::{LinkOptions, LinkReport, realize};
use crate::tree::render::{Style, render};
use crate::tree::{DEFAULT_DEPTH, Tree};
use crate::vpath::VPath;

/// Behaviour switches for a stow run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct StowOptions {
    /// Replace any existing destination entry, not only symlinks.
    pub force: bool,
    /// Create missing parent directories in the destination.
    pub make_parents: bool,
    /// Apply `[redirect]` sections.
    pub redirects: bool,
    /// Ask before linking.
    pub interactive: bool,
    /// Report what would be linked without touching the destination.
    pub dry_run: bool,
    /// Depth budget for every tree operation.
    pub depth: usize,
    /// Paths removed from the tree before ignores are applied.
    pub exclude: Vec<VPath>,
}

impl Default for StowOptions {
    fn default() -> Self {
        Self {
            force: false,
            make_parents: true,
            redirects: true,
            interactive: true,
            dry_run: false,
            depth: DEFAULT_DEPTH,
            exclude: Vec::new(),
        }
    }
}

/// How a run ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StowOutcome {
    /// The source tree had nothing to link.
    Empty,
    /// The operator declined the confirmation.
    Aborted,
    /// Dry run finished; the report counts what would have happened.
    DryRun(LinkReport),
    /// Links were written.
    Linked(LinkReport),
}

/// Links one source tree into one destination directory.
#[derive(Debug)]
pub struct Stower {
    source: VPath,
    destination: VPath,
    options: StowOptions,
    rules: RuleContext,
}

impl Stower {
    /// Prepare a run.  Nothing is read until [`Stower::plan`] or
    /// [`Stower::stow`] is called.
    #[must_use]
    pub const fn new(source: VPath, destination: VPath, options: StowOptions, rules: RuleContext) -> Self {
        Self {
            source,
            destination,
            options,
            rules,
        }
    }

    /// Build the final virtual tree without linking anything.
    ///
    /// Returns `None` when the source directory is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if source and destination coincide, the destination
    /// is not a directory, a rule file fails under enforced integrity, or an
    /// exclusion names the source itself.
    pub fn plan(&self, log: &dyn Log) -> Result<Option<Tree>, StowError> {
        if self.source == self.destination {
            return Err(StowError::SameSourceAndDestination {
                path: self.source.as_path().to_path_buf(),
            });
        }
        if !self.destination.as_path().is_dir() {
            return Err(StowError::InvalidTarget {
                path: self.destination.as_path().to_path_buf(),
                reason: "not an existing directory".to_string(),
            });
        }
        let depth = self.options.depth;

        log.stage(&format!("Reading {}", self.source));
        let mut tree = Tree::new(self.source.clone()).traversed();
        if tree.is_empty() {
            log.info(&render(&tree, Style::detect()));
            log.warn("source tree is empty, nothing to do");
            return Ok(None);
        }

        if self.options.redirects {
            log.debug("resolving redirects");
            tree.move_redirected(&self.destination, &self.rules, depth)?;
        }

        for excluded in &self.options.exclude {
            if tree.contains(excluded) && tree.trim_content(excluded.clone(), depth)?.is_some() {
                log.debug(&format!("excluded {excluded}"));
            }
        }

        log.debug("applying ignore rules");
        tree.trim_ignored(&self.rules, depth)?;
        tree.trim_by_branch_rule(&|branch: &Tree, _: usize| branch.is_empty(), depth);
        Ok(Some(tree))
    }

    /// Run the whole pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error in the same cases as [`Stower::plan`].  Individual
    /// link failures are logged and counted in the report instead.
    pub fn stow(&self, log: &dyn Log, confirm: &dyn Confirm) -> Result<StowOutcome, StowError> {
        let Some(tree) = self.plan(log)? else {
            return Ok(StowOutcome::Empty);
        };
        log.info(&render(&tree, Style::detect()));

        let dry_run = self.options.dry_run;
        if !dry_run && self.options.interactive {
            log.info("The following action is not reversible.");
            if !confirm.confirm(&self.destination) {
                log.warn("Aborting.");
                return Ok(StowOutcome::Aborted);
            }
        }

        log.stage(if dry_run { "Checking links" } else { "Linking" });
        let options = LinkOptions {
            make_parents: self.options.make_parents,
            dry_run,
        };
        let report = realize(&tree, &self.destination, &|dst: &VPath| self.is_linkable(dst), options, log);
        log.info(&report.to_string());

        Ok(if dry_run {
            StowOutcome::DryRun(report)
        } else {
            StowOutcome::Linked(report)
        })
    }

    /// Whether a link may be placed at `destination`.
    ///
    /// The entry must be missing, a symlink, or force must be on; and the
    /// destination must never lie inside the source tree.
    #[must_use]
    pub fn is_linkable(&self, destination: &VPath) -> bool {
        let replaceable =
            self.options.force || !destination.as_path().exists() || destination.is_symlink();
        replaceable && !self.inside_source(destination)
    }

    fn inside_source(&self, destination: &VPath) -> bool {
        self.source.contains(destination)
            || destination
                .parent()
                .and_then(|parent| dunce::canonicalize(parent).ok())
                .is_some_and(|real| self.source.contains(&VPath::new(real).join(destination.name())))
    }
}
