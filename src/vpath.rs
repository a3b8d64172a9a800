//! Absolute path values and the containment algebra used by the virtual tree.
use std::ffi::OsStr;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// An absolute, lexically normalized filesystem path.
///
/// `VPath` is a value type: it is never mutated after construction, and two
/// values compare equal when their normalized components are equal.  Paths
/// may denote entries that do not exist (virtual directories created while
/// resolving redirects); every filesystem query degrades gracefully for them.
///
/// # Examples
///
/// ```
/// use pstow::vpath::VPath;
///
/// let p = VPath::new("/home/user/./dotfiles/../dotfiles/vim");
/// assert_eq!(p.as_path(), std::path::Path::new("/home/user/dotfiles/vim"));
/// assert_eq!(p.name(), "vim");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VPath(PathBuf);

impl VPath {
    /// Build a `VPath`, resolving relative paths against the current working
    /// directory and removing `.` and `..` components lexically.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| Path::new("/").join(path), |cwd| cwd.join(path))
        };
        Self(normalize(&absolute))
    }

    /// Borrow the underlying path.
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Final component of the path (empty for the filesystem root).
    #[must_use]
    pub fn name(&self) -> &OsStr {
        self.0.file_name().unwrap_or_default()
    }

    /// Append `tail` and normalize the result.
    #[must_use]
    pub fn join(&self, tail: impl AsRef<Path>) -> Self {
        Self::new(self.0.join(tail))
    }

    /// Parent directory, or `None` for the filesystem root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.0.parent().map(|p| Self(p.to_path_buf()))
    }

    /// Whether an entry exists at this path, without following symlinks.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.0.symlink_metadata().is_ok()
    }

    /// Whether the path is a directory that is not itself a symlink.
    #[must_use]
    pub fn is_real_dir(&self) -> bool {
        self.0.symlink_metadata().is_ok_and(|m| m.is_dir())
    }

    /// Whether the path is a symlink (dangling or not).
    #[must_use]
    pub fn is_symlink(&self) -> bool {
        self.0.symlink_metadata().is_ok_and(|m| m.is_symlink())
    }

    /// The directory portion of the path, measured against the filesystem.
    ///
    /// An existing directory yields itself; an existing non-directory yields
    /// its parent; a path that does not exist yields itself unchanged.
    #[must_use]
    pub fn dir_parts(&self) -> PathBuf {
        if !self.exists() || self.0.is_dir() {
            return self.0.clone();
        }
        self.0
            .parent()
            .map_or_else(|| self.0.clone(), Path::to_path_buf)
    }

    /// Whether `other` logically belongs under `self`.
    ///
    /// Containment holds when the directory components of `other` extend the
    /// directory components of `self`; a path always contains itself.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        other.dir_parts().starts_with(self.dir_parts())
    }

    /// Substitute the first textual occurrence of `old` with `new`.
    ///
    /// Used to re-express a resolved destination, rooted at the real target
    /// directory, in the coordinates of the source tree.
    #[must_use]
    pub fn redirect(&self, old: &Self, new: &Self) -> Self {
        let text = self.0.to_string_lossy();
        let old = old.0.to_string_lossy();
        let new = new.0.to_string_lossy();
        Self::new(text.replacen(old.as_ref(), new.as_ref(), 1))
    }

    /// The immediate child of `self` on the way toward `other`.
    ///
    /// Returns `None` when both paths share the same directory components.
    ///
    /// ```
    /// use pstow::vpath::VPath;
    ///
    /// let root = VPath::new("/nonexistent/root");
    /// let deep = VPath::new("/nonexistent/root/a/b/c");
    /// assert_eq!(root.next_component(&deep), Some(VPath::new("/nonexistent/root/a")));
    /// assert_eq!(root.next_component(&root), None);
    /// ```
    #[must_use]
    pub fn next_component(&self, other: &Self) -> Option<Self> {
        let own = self.dir_parts();
        let theirs = other.dir_parts();
        if own == theirs {
            return None;
        }

        let mut own_components = own.components();
        let mut their_components = theirs.components();
        let mut built = PathBuf::new();
        loop {
            match (own_components.next(), their_components.next()) {
                (None, None) => return None,
                (Some(mine), Some(yours)) => {
                    built.push(mine);
                    if mine != yours {
                        return Some(Self::new(built));
                    }
                }
                (Some(next), None) | (None, Some(next)) => {
                    built.push(next);
                    return Some(Self::new(built));
                }
            }
        }
    }
}

impl AsRef<Path> for VPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl From<&Path> for VPath {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for VPath {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Lexically remove `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
