//! Command-line interface definition.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for pstow.
#[derive(Parser, Debug)]
#[command(
    name = "pstow",
    about = "Link a source tree into a target directory, driven by .stowconfig rules",
    version
)]
pub struct Cli {
    /// Subcommand; without one, the source is linked into the target
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[allow(missing_docs)]
    #[command(flatten)]
    pub global: GlobalOpts,
}

impl Cli {
    /// Name used for the log file of this invocation.
    #[must_use]
    pub const fn command_name(&self) -> &'static str {
        match self.command {
            None => "stow",
            Some(Command::Status) => "status",
            Some(Command::Completions { .. }) => "completions",
            Some(Command::Version) => "version",
        }
    }
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct GlobalOpts {
    /// Source directory to link from (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub source: Option<PathBuf>,

    /// Target directory to link into
    #[arg(short, long, global = true)]
    pub target: Option<PathBuf>,

    /// Abort on any .stowconfig error instead of skipping the bad part
    #[arg(short = 'i', long, global = true)]
    pub enforce_integrity: bool,

    /// Replace existing files in the target, not only symlinks
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long = "yes", global = true)]
    pub assume_yes: bool,

    /// Paths to leave out of the source tree (comma separated or repeated)
    #[arg(short, long, global = true, value_delimiter = ',')]
    pub exclude: Vec<PathBuf>,

    /// Profile used by if-profile blocks [default: default]
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Do not create missing parent directories in the target
    #[arg(short = 'n', long, global = true)]
    pub no_parents: bool,

    /// Ignore [redirect] sections
    #[arg(short = 'r', long, global = true)]
    pub no_redirects: bool,

    /// Depth limit for tree operations
    #[arg(long, global = true)]
    pub depth: Option<usize>,

    /// Settings file (defaults to $XDG_CONFIG_HOME/pstow/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show what would be linked into the target (home directory by default)
    Status,
    /// Generate a shell completion script
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
    /// Print version information
    Version,
}
