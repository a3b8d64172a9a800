//! Optional user settings file.
//!
//! Settings live in `$XDG_CONFIG_HOME/pstow/config.toml` (or
//! `~/.config/pstow/config.toml`) unless `--config` names another file:
//!
//! ```toml
//! target = "~"
//! profile = "work"
//! exclude = ["~/dotfiles/scratch"]
//! no_redirects = false
//! ```
//!
//! Command-line values take precedence; boolean switches are enabled when
//! either source enables them.
pub mod toml_loader;

use anyhow::{Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Values read from the settings file.  Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Default destination directory.
    pub target: Option<PathBuf>,
    /// Default profile for `if-profile` blocks.
    pub profile: Option<String>,
    /// Paths always excluded from the source tree.
    pub exclude: Vec<PathBuf>,
    /// Always replace conflicting files.
    pub force: bool,
    /// Never ask for confirmation.
    pub assume_yes: bool,
    /// Never create parent directories.
    pub no_parents: bool,
    /// Ignore `[redirect]` sections.
    pub no_redirects: bool,
    /// Abort on any rule file error.
    pub enforce_integrity: bool,
    /// Depth budget for tree operations.
    pub depth: Option<usize>,
}

impl Settings {
    /// Load settings from `explicit`, or from [`default_path`] when `None`.
    ///
    /// A missing default file yields [`Settings::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file does not exist, or if
    /// the file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) if !path.exists() => bail!("config file not found: {}", path.display()),
            Some(path) => toml_loader::load_config(path),
            None => default_path().map_or_else(|| Ok(Self::default()), |p| toml_loader::load_config(&p)),
        }
    }
}

/// Location of the settings file when `--config` is not given.
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("pstow").join("config.toml"))
}
