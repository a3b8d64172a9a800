// Shared helpers for integration tests.
//
// Provides a temporary source/target pair and a fluent builder so each
// integration test can lay out an isolated tree without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use pstow::logging::Log;
use pstow::prompt::Confirm;
use pstow::stowconfig::STOWCONFIG_FILE_NAME;
use pstow::stowconfig::condition::RuleContext;
use pstow::stower::{StowOptions, Stower};
use pstow::vpath::VPath;

/// A source and a target directory inside one [`tempfile::TempDir`].
///
/// Both paths are canonical so that link targets compare equal on systems
/// where the temp directory sits behind a symlink.
pub struct Fixture {
    /// Owns the scratch directory; deleted on drop.
    pub root: tempfile::TempDir,
    /// Canonical source directory.
    pub src: PathBuf,
    /// Canonical target directory.
    pub dst: PathBuf,
}

impl Fixture {
    /// Create empty `src/` and `dst/` directories.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let base = dunce::canonicalize(root.path()).expect("canonicalize temp dir");
        let src = base.join("src");
        let dst = base.join("dst");
        std::fs::create_dir(&src).expect("create src");
        std::fs::create_dir(&dst).expect("create dst");
        Self { root, src, dst }
    }

    /// Write `content` to `src/<rel>`, creating parent directories.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        write(&self.src.join(rel), content);
        self
    }

    /// Create the empty directory `src/<rel>`.
    pub fn with_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.src.join(rel)).expect("create source dir");
        self
    }

    /// Write a `.stowconfig` into `src/<rel_dir>`.
    pub fn with_stowconfig(self, rel_dir: &str, text: &str) -> Self {
        write(&self.src.join(rel_dir).join(STOWCONFIG_FILE_NAME), text);
        self
    }

    /// Write `content` to `dst/<rel>` before the run.
    pub fn with_existing(self, rel: &str, content: &str) -> Self {
        write(&self.dst.join(rel), content);
        self
    }

    /// A stower for `src -> dst` with the default rule context.
    pub fn stower(&self, options: StowOptions) -> Stower {
        self.stower_with(options, RuleContext::default())
    }

    /// A stower for `src -> dst` with explicit rules.
    pub fn stower_with(&self, options: StowOptions, rules: RuleContext) -> Stower {
        Stower::new(VPath::new(&self.src), VPath::new(&self.dst), options, rules)
    }

    /// `src/<rel>`.
    pub fn src_path(&self, rel: &str) -> PathBuf {
        self.src.join(rel)
    }

    /// `dst/<rel>`.
    pub fn dst_path(&self, rel: &str) -> PathBuf {
        self.dst.join(rel)
    }

    /// Where `dst/<rel>` points, if it is a symlink.
    pub fn link_at(&self, rel: &str) -> Option<PathBuf> {
        std::fs::read_link(self.dst_path(rel)).ok()
    }

    /// Sorted names of the entries directly inside `dst/<rel>`.
    pub fn dst_entries(&self, rel: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dst_path(rel))
            .expect("list target dir")
            .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

/// Non-interactive options: no prompt, everything else default.
pub fn batch() -> StowOptions {
    StowOptions {
        interactive: false,
        ..StowOptions::default()
    }
}

/// A [`Log`] that discards everything.
#[derive(Debug, Default)]
pub struct SilentLog;

impl Log for SilentLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn dry_run(&self, _msg: &str) {}
}

/// A [`Log`] that keeps warnings, errors and dry-run lines for inspection.
#[derive(Debug, Default)]
pub struct RecordingLog {
    /// Messages passed to [`Log::warn`].
    pub warnings: Mutex<Vec<String>>,
    /// Messages passed to [`Log::error`].
    pub errors: Mutex<Vec<String>>,
    /// Messages passed to [`Log::dry_run`].
    pub dry_runs: Mutex<Vec<String>>,
}

impl RecordingLog {
    /// Whether any warning contains `needle`.
    pub fn warned(&self, needle: &str) -> bool {
        self.warnings.lock().unwrap().iter().any(|m| m.contains(needle))
    }

    /// Whether any error was logged.
    pub fn has_errors(&self) -> bool {
        !self.errors.lock().unwrap().is_empty()
    }
}

impl Log for RecordingLog {
    fn stage(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
    fn warn(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }
    fn error(&self, msg: &str) {
        self.errors.lock().unwrap().push(msg.to_string());
    }
    fn dry_run(&self, msg: &str) {
        self.dry_runs.lock().unwrap().push(msg.to_string());
    }
}

/// A [`Confirm`] oracle with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct Answer(pub bool);

impl Confirm for Answer {
    fn confirm(&self, _destination: &VPath) -> bool {
        self.0
    }
}
