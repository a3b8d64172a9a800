//! Top-level command handlers.
pub mod completions;
pub mod stow;
pub mod version;

use anyhow::{Context as _, Result, bail};
use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::config::Settings;
use crate::logging::Log;
use crate::stowconfig::condition::{ErrorStrategy, RuleContext};
use crate::stowconfig::glob::expand_tilde;
use crate::stower::{StowOptions, Stower};
use crate::tree::DEFAULT_DEPTH;
use crate::vpath::VPath;

/// Profile used when neither the command line nor the settings file names one.
pub const DEFAULT_PROFILE: &str = "default";

/// Everything a stow run needs, merged from the command line and the
/// settings file.
///
/// Command-line values win; boolean switches are on when either side turns
/// them on; exclusions from both sides are combined.
#[derive(Debug)]
pub struct RunSetup {
    /// Canonical source directory.
    pub source: VPath,
    /// Canonical target directory.
    pub target: VPath,
    /// Active profile for `if-profile` blocks.
    pub profile: String,
    /// How rule file errors are treated.
    pub strategy: ErrorStrategy,
    /// Pipeline switches.
    pub options: StowOptions,
}

impl RunSetup {
    /// Load the settings file and merge it with `global`.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is unreadable, no target can be
    /// determined, or the source or target directory does not exist.
    pub fn init(global: &GlobalOpts, dry_run: bool, log: &dyn Log) -> Result<Self> {
        let settings = Settings::load(global.config.as_deref())?;
        let setup = Self::merge(global, &settings, dry_run)?;

        log.debug(&format!("source: {}", setup.source));
        log.debug(&format!("target: {}", setup.target));
        log.debug(&format!("profile: {}", setup.profile));
        for excluded in &setup.options.exclude {
            log.debug(&format!("exclude: {excluded}"));
        }
        Ok(setup)
    }

    /// Merge command-line options over `settings`.
    ///
    /// In dry-run mode a missing target falls back to the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no target can be determined, or the source or
    /// target directory cannot be resolved.
    pub fn merge(global: &GlobalOpts, settings: &Settings, dry_run: bool) -> Result<Self> {
        let source = match &global.source {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };
        let source = canonical_dir(&source, "source")?;

        let target = match (&global.target, &settings.target) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) => expand_path(path),
            (None, None) if dry_run => home_dir().context("Failed to determine home directory")?,
            (None, None) => bail!("no target directory given; pass --target or set `target` in the settings file"),
        };
        let target = canonical_dir(&target, "target")?;

        let profile = global
            .profile
            .clone()
            .or_else(|| settings.profile.clone())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let strategy = if global.enforce_integrity || settings.enforce_integrity {
            ErrorStrategy::EnforceIntegrity
        } else {
            ErrorStrategy::Ignore
        };

        let exclude = global
            .exclude
            .iter()
            .cloned()
            .chain(settings.exclude.iter().map(PathBuf::as_path).map(expand_path))
            .map(VPath::new)
            .collect();

        let options = StowOptions {
            force: global.force || settings.force,
            make_parents: !(global.no_parents || settings.no_parents),
            redirects: !(global.no_redirects || settings.no_redirects),
            interactive: !(global.assume_yes || settings.assume_yes),
            dry_run,
            depth: global.depth.or(settings.depth).unwrap_or(DEFAULT_DEPTH),
            exclude,
        };

        Ok(Self {
            source,
            target,
            profile,
            strategy,
            options,
        })
    }

    /// Turn the merged setup into a ready-to-run [`Stower`].
    #[must_use]
    pub fn into_stower(self) -> Stower {
        let rules = RuleContext::new(self.profile).with_strategy(self.strategy);
        Stower::new(self.source, self.target, self.options, rules)
    }
}

fn canonical_dir(path: &Path, role: &str) -> Result<VPath> {
    let real = dunce::canonicalize(path)
        .with_context(|| format!("Failed to resolve {role} directory: {}", path.display()))?;
    if !real.is_dir() {
        bail!("{role} is not a directory: {}", real.display());
    }
    Ok(VPath::new(real))
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(expand_tilde(&path.to_string_lossy()))
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["pstow"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv).global
    }

    fn dirs() -> (tempfile::TempDir, String, String) {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        std::fs::create_dir(&src).unwrap();
        std::fs::create_dir(&dst).unwrap();
        (
            tmp,
            src.to_string_lossy().into_owned(),
            dst.to_string_lossy().into_owned(),
        )
    }

    #[test]
    fn command_line_only() {
        let (_tmp, src, dst) = dirs();
        let setup = RunSetup::merge(&global(&["-s", &src, "-t", &dst]), &Settings::default(), false).unwrap();
        assert_eq!(setup.source, VPath::new(dunce::canonicalize(&src).unwrap()));
        assert_eq!(setup.target, VPath::new(dunce::canonicalize(&dst).unwrap()));
        assert_eq!(setup.profile, DEFAULT_PROFILE);
        assert_eq!(setup.strategy, ErrorStrategy::Ignore);
        assert_eq!(setup.options, StowOptions::default());
    }

    #[test]
    fn settings_fill_gaps() {
        let (_tmp, src, dst) = dirs();
        let settings = Settings {
            target: Some(PathBuf::from(&dst)),
            profile: Some("work".to_string()),
            force: true,
            no_parents: true,
            depth: Some(4),
            ..Settings::default()
        };
        let setup = RunSetup::merge(&global(&["-s", &src]), &settings, false).unwrap();
        assert_eq!(setup.target, VPath::new(dunce::canonicalize(&dst).unwrap()));
        assert_eq!(setup.profile, "work");
        assert!(setup.options.force);
        assert!(!setup.options.make_parents);
        assert_eq!(setup.options.depth, 4);
    }

    #[test]
    fn command_line_wins() {
        let (_tmp, src, dst) = dirs();
        let settings = Settings {
            target: Some(PathBuf::from("/does/not/exist")),
            profile: Some("work".to_string()),
            depth: Some(4),
            ..Settings::default()
        };
        let setup = RunSetup::merge(
            &global(&["-s", &src, "-t", &dst, "-p", "home", "--depth", "1"]),
            &settings,
            false,
        )
        .unwrap();
        assert_eq!(setup.profile, "home");
        assert_eq!(setup.options.depth, 1);
    }

    #[test]
    fn switches_are_or_ed() {
        let (_tmp, src, dst) = dirs();
        let settings = Settings {
            assume_yes: true,
            enforce_integrity: true,
            ..Settings::default()
        };
        let setup = RunSetup::merge(&global(&["-s", &src, "-t", &dst, "-r"]), &settings, true).unwrap();
        assert!(!setup.options.interactive);
        assert!(!setup.options.redirects);
        assert!(setup.options.dry_run);
        assert_eq!(setup.strategy, ErrorStrategy::EnforceIntegrity);
    }

    #[test]
    fn exclusions_are_combined() {
        let (_tmp, src, dst) = dirs();
        let settings = Settings {
            exclude: vec![PathBuf::from("/x/from-settings")],
            ..Settings::default()
        };
        let setup =
            RunSetup::merge(&global(&["-s", &src, "-t", &dst, "-e", "/x/from-cli"]), &settings, false).unwrap();
        assert_eq!(
            setup.options.exclude,
            vec![VPath::new("/x/from-cli"), VPath::new("/x/from-settings")]
        );
    }

    #[test]
    fn missing_target_is_an_error_outside_dry_run() {
        let (_tmp, src, _dst) = dirs();
        let err = RunSetup::merge(&global(&["-s", &src]), &Settings::default(), false).unwrap_err();
        assert!(err.to_string().contains("no target directory"));
    }

    #[test]
    fn nonexistent_source_is_an_error() {
        let (tmp, _src, dst) = dirs();
        let missing = tmp.path().join("missing").to_string_lossy().into_owned();
        let err = RunSetup::merge(&global(&["-s", &missing, "-t", &dst]), &Settings::default(), false)
            .unwrap_err();
        assert!(err.to_string().contains("source directory"));
    }

    #[test]
    fn file_target_is_an_error() {
        let (tmp, src, _dst) = dirs();
        let file = tmp.path().join("file");
        std::fs::write(&file, "").unwrap();
        let file = file.to_string_lossy().into_owned();
        let err = RunSetup::merge(&global(&["-s", &src, "-t", &file]), &Settings::default(), false)
            .unwrap_err();
        assert!(err.to_string().contains("target is not a directory"));
    }
}
