//! Human-readable printout of a virtual tree, shown before linking.
use std::fmt::Write as _;
use std::io::IsTerminal as _;

use super::{Node, Tree};

/// Whether the rendering may contain ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Directories in bold blue.
    Color,
    /// No escape sequences.
    Plain,
}

impl Style {
    /// [`Style::Color`] when stdout is a terminal.
    #[must_use]
    pub fn detect() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Color
        } else {
            Self::Plain
        }
    }

    fn dir(self, name: &str) -> String {
        match self {
            Self::Color => format!("\x1b[1;34m{name}/\x1b[0m"),
            Self::Plain => format!("{name}/"),
        }
    }
}

/// Render `tree` in the style of the `tree` command, children sorted by
/// name.  The home directory prefix of the root is shortened to `~`.
///
/// ```
/// use pstow::tree::{Node, Tree};
/// use pstow::tree::render::{render, Style};
/// use pstow::vpath::VPath;
///
/// let mut tree = Tree::new(VPath::new("/nonexistent/src"));
/// tree.push(Node::Leaf(VPath::new("/nonexistent/src/a.txt")));
/// assert_eq!(render(&tree, Style::Plain), "/nonexistent/src/\n└── a.txt\n");
/// ```
#[must_use]
pub fn render(tree: &Tree, style: Style) -> String {
    let mut out = style.dir(&shorten_home(&tree.path().to_string()));
    out.push('\n');
    render_children(tree, style, "", &mut out);
    out
}

fn render_children(tree: &Tree, style: Style, prefix: &str, out: &mut String) {
    let mut children: Vec<&Node> = tree.children().iter().collect();
    children.sort_by(|a, b| a.name().cmp(b.name()));

    let count = children.len();
    for (idx, child) in children.into_iter().enumerate() {
        let last = idx + 1 == count;
        let (connector, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        let name = child.name().to_string_lossy();
        match child {
            Node::Leaf(_) => {
                let _ = writeln!(out, "{prefix}{connector}{name}");
            }
            Node::Branch(branch) => {
                let _ = writeln!(out, "{prefix}{connector}{}", style.dir(&name));
                render_children(branch, style, &format!("{prefix}{indent}"), out);
            }
        }
    }
}

fn shorten_home(path: &str) -> String {
    match std::env::var("HOME") {
        Ok(home) if !home.is_empty() && home != "/" => match path.strip_prefix(home.trim_end_matches('/')) {
            Some("") => "~".to_string(),
            Some(rest) if rest.starts_with('/') => format!("~{rest}"),
            _ => path.to_string(),
        },
        _ => path.to_string(),
    }
}
