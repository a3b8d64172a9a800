//! Command: generate shell completion scripts.
use clap::CommandFactory as _;
use clap_complete::Shell;
use std::io::Write;

use crate::cli::Cli;

/// Write the completion script for `shell` to `out`.
pub fn run(shell: Shell, out: &mut impl Write) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, out);
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn bash_script_mentions_binary_and_flags() {
        let mut out = Vec::new();
        run(Shell::Bash, &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("pstow"));
        assert!(script.contains("--no-redirects"));
    }

    #[test]
    fn zsh_script_is_generated() {
        let mut out = Vec::new();
        run(Shell::Zsh, &mut out);
        assert!(String::from_utf8(out).unwrap().contains("#compdef pstow"));
    }
}
