//! Per-directory `.stowconfig` rule files.
//!
//! A rule file is a line-oriented list of glob patterns grouped into
//! sections:
//!
//! ```text
//! // comments start with two slashes
//! [ignore]
//! *.bak
//! !!keep.bak
//! [redirect]
//! nvim ::: .config
//! [if-pkg::: git]
//! gitconfig ::: .config/git/config
//! [end]
//! ```
//!
//! Parsing happens on first access and is cached for the lifetime of the
//! owning [`Tree`](crate::tree::Tree).
pub mod condition;
pub mod glob;
pub mod redirect;

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::fs;

use crate::error::StowconfigError;
use crate::tree::Node;
use crate::vpath::VPath;

use condition::{Condition, ErrorStrategy, RuleContext};
use redirect::RedirectEntry;

/// File name of a rule file.
pub const STOWCONFIG_FILE_NAME: &str = ".stowconfig";

const IGNORE_HEADER: &str = "[ignore]";
const REDIRECT_HEADER: &str = "[redirect]";
const END_BLOCK: &str = "[end]";
const COMMENT_PREFIX: &str = "//";
const UNIGNORE_PREFIX: &str = "!!";
const REDIRECT_DELIMITER: &str = ":::";

/// Section a line is dispatched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Ignore,
    Redirect,
}

#[derive(Debug, Clone, Default)]
struct Rules {
    ignorables: BTreeSet<VPath>,
    redirectables: Vec<RedirectEntry>,
    failure: Option<String>,
}

/// A lazily parsed `.stowconfig` file.
#[derive(Debug, Clone)]
pub struct Stowconfig {
    path: VPath,
    rules: OnceCell<Rules>,
}

impl Stowconfig {
    /// Wrap the rule file at `path` without reading it.
    #[must_use]
    pub const fn new(path: VPath) -> Self {
        Self {
            path,
            rules: OnceCell::new(),
        }
    }

    /// Location of the rule file.
    #[must_use]
    pub const fn path(&self) -> &VPath {
        &self.path
    }

    /// Every leaf excluded by `[ignore]` lines.
    ///
    /// # Errors
    ///
    /// Returns [`StowconfigError::Integrity`] if parsing failed and the
    /// context enforces integrity.
    pub fn ignorables(&self, ctx: &RuleContext) -> Result<&BTreeSet<VPath>, StowconfigError> {
        Ok(&self.rules(ctx)?.ignorables)
    }

    /// Every redirect whose source is not ignored.
    ///
    /// # Errors
    ///
    /// Returns [`StowconfigError::Integrity`] if parsing failed and the
    /// context enforces integrity.
    pub fn redirectables(&self, ctx: &RuleContext) -> Result<&[RedirectEntry], StowconfigError> {
        Ok(&self.rules(ctx)?.redirectables)
    }

    fn rules(&self, ctx: &RuleContext) -> Result<&Rules, StowconfigError> {
        let rules = self.rules.get_or_init(|| Parser::new(&self.path, ctx).run());
        if let Some(reason) = &rules.failure
            && ctx.strategy() == ErrorStrategy::EnforceIntegrity
        {
            return Err(StowconfigError::Integrity {
                path: self.path.as_path().to_path_buf(),
                reason: reason.clone(),
            });
        }
        Ok(rules)
    }
}

/// Single-pass reader for one rule file.
struct Parser<'a> {
    file: &'a VPath,
    dir: VPath,
    ctx: &'a RuleContext,
    ignorables: BTreeSet<VPath>,
    redirectables: Vec<RedirectEntry>,
    rejected: Option<String>,
}

impl<'a> Parser<'a> {
    fn new(file: &'a VPath, ctx: &'a RuleContext) -> Self {
        Self {
            file,
            dir: file.parent().unwrap_or_else(|| file.clone()),
            ctx,
            ignorables: BTreeSet::new(),
            redirectables: Vec::new(),
            rejected: None,
        }
    }

    fn run(mut self) -> Rules {
        let failure = match fs::read_to_string(self.file) {
            Ok(text) => self.parse(&text).err(),
            Err(source) => Some(StowconfigError::Io {
                path: self.file.as_path().to_path_buf(),
                source,
            }),
        }
        .map(|e| {
            tracing::error!("got {e} while parsing {}", self.file);
            e.to_string()
        })
        .or_else(|| self.rejected.take());
        self.finish(failure)
    }

    fn parse(&mut self, text: &str) -> Result<(), StowconfigError> {
        let mut lines = text.lines().map(str::trim);
        let mut directive = Directive::Ignore;
        while let Some(line) = lines.next() {
            if is_skippable(line) {
                continue;
            }
            match line {
                IGNORE_HEADER => directive = Directive::Ignore,
                REDIRECT_HEADER => directive = Directive::Redirect,
                END_BLOCK => tracing::warn!("{}: stray {END_BLOCK} ignored", self.file),
                _ => {
                    if let Some((condition, tokens)) = Condition::parse_header(line) {
                        self.conditional_block(directive, line, condition, tokens, &mut lines)?;
                    } else {
                        self.dispatch(directive, line)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Consume a conditional block up to its `[end]`, dispatching its lines
    /// to `directive` only when the condition holds.
    fn conditional_block<'l>(
        &mut self,
        directive: Directive,
        header: &str,
        condition: Condition,
        tokens: &str,
        lines: &mut impl Iterator<Item = &'l str>,
    ) -> Result<(), StowconfigError> {
        let tokens = shlex::split(tokens.trim()).unwrap_or_default();
        let active = if tokens.is_empty() {
            tracing::error!("skipping invalid {header} block: nothing listed after the prefix");
            false
        } else {
            let holds = condition.holds(&tokens, self.ctx);
            if !holds {
                tracing::debug!("condition {header} not fulfilled, skipping block");
            }
            holds
        };

        for line in lines.by_ref() {
            if line == END_BLOCK {
                return Ok(());
            }
            if !active || is_skippable(line) {
                continue;
            }
            if is_header(line) {
                tracing::warn!("ignoring header {line} nested in {header}");
                continue;
            }
            tracing::debug!("applying {header} entry: {line}");
            self.dispatch(directive, line)?;
        }
        Err(StowconfigError::UnterminatedBlock {
            path: self.file.as_path().to_path_buf(),
            header: header.to_string(),
        })
    }

    fn dispatch(&mut self, directive: Directive, line: &str) -> Result<(), StowconfigError> {
        match directive {
            Directive::Ignore => self.ignore_line(line),
            Directive::Redirect => {
                self.redirect_line(line);
                Ok(())
            }
        }
    }

    fn ignore_line(&mut self, line: &str) -> Result<(), StowconfigError> {
        let (unignore, pattern) = line
            .strip_prefix(UNIGNORE_PREFIX)
            .map_or((false, line), |rest| (true, rest.trim_start()));
        let nodes = match glob::parse_glob_line(&self.dir, pattern) {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::error!("skipping invalid ignore pattern {pattern}: {e}");
                return Ok(());
            }
        };

        for node in nodes {
            let leaves = glob::flatten(&node).map_err(|source| StowconfigError::Io {
                path: node.path().as_path().to_path_buf(),
                source,
            })?;
            if unignore {
                for leaf in &leaves {
                    self.ignorables.remove(leaf);
                }
            } else {
                self.ignorables.extend(leaves);
            }
        }
        Ok(())
    }

    fn redirect_line(&mut self, line: &str) {
        let words = shlex::split(line).unwrap_or_default();
        let [source, delimiter, destination] = words.as_slice() else {
            tracing::error!(
                "skipping invalid redirect entry {line}: expected \"source/path\" ::: \"destination/path\""
            );
            return;
        };
        if delimiter != REDIRECT_DELIMITER {
            tracing::error!("skipping invalid redirect entry {line}: missing {REDIRECT_DELIMITER}");
            return;
        }

        let nodes = match glob::parse_glob_line(&self.dir, source) {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::error!("skipping invalid redirect source {source}: {e}");
                return;
            }
        };
        for node in nodes {
            if node.path().contains(&self.dir) {
                let reason = format!("redirect source {source} names the directory {} itself", self.dir);
                tracing::error!("skipping redirect entry {line}: {reason}");
                self.rejected.get_or_insert(reason);
                continue;
            }
            self.redirectables
                .push(RedirectEntry::new(node, destination.as_str()));
        }
    }

    /// Drop redirects whose source is entirely ignored.
    fn finish(self, failure: Option<String>) -> Rules {
        let ignorables = self.ignorables;
        let redirectables = self
            .redirectables
            .into_iter()
            .filter(|entry| {
                let shadowed = is_ignored(entry.source(), &ignorables);
                if shadowed {
                    tracing::debug!("redirect of {} dropped: source is ignored", entry.source().path());
                }
                !shadowed
            })
            .collect();
        Rules {
            ignorables,
            redirectables,
            failure,
        }
    }
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with(COMMENT_PREFIX)
}

fn is_header(line: &str) -> bool {
    matches!(line, IGNORE_HEADER | REDIRECT_HEADER) || Condition::parse_header(line).is_some()
}

fn is_ignored(source: &Node, ignorables: &BTreeSet<VPath>) -> bool {
    match source {
        Node::Leaf(path) => ignorables.contains(path),
        Node::Branch(_) => glob::flatten(source)
            .is_ok_and(|leaves| !leaves.is_empty() && leaves.iter().all(|l| ignorables.contains(l))),
    }
}
