//! Interactive yes/no confirmation before anything is written.
use std::io::{self, BufRead, Write};

use crate::vpath::VPath;

/// Oracle asked once per run before the tree is linked.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Whether linking into `destination` may proceed.
    fn confirm(&self, destination: &VPath) -> bool;
}

/// Asks on the terminal, reading the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

impl Confirm for StdinPrompt {
    fn confirm(&self, destination: &VPath) -> bool {
        let stdin = io::stdin();
        let stdout = io::stdout();
        ask(&mut stdin.lock(), &mut stdout.lock(), destination)
    }
}

/// Ask until the answer is `y`/`yes` or `n`/`no` (case-insensitive).
///
/// End of input, or any I/O failure, counts as no.
pub fn ask(input: &mut impl BufRead, output: &mut impl Write, destination: &VPath) -> bool {
    let mut reply = String::new();
    loop {
        if write!(
            output,
            "Do you want to link the tree to destination \x1b[31;1m{destination}/...\x1b[0m [y/n]? "
        )
        .and_then(|()| output.flush())
        .is_err()
        {
            return false;
        }

        reply.clear();
        match input.read_line(&mut reply) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match reply.trim().to_lowercase().as_str() {
            "y" | "yes" => return true,
            "n" | "no" => return false,
            other => {
                let _ = writeln!(
                    output,
                    "Invalid reply {other:?}, please answer with y/yes for yes, or n/no for no."
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> (bool, String) {
        let mut input = Cursor::new(text.as_bytes().to_vec());
        let mut output = Vec::new();
        let yes = ask(&mut input, &mut output, &VPath::new("/nonexistent/dst"));
        (yes, String::from_utf8(output).unwrap())
    }

    #[test]
    fn accepts_yes_variants() {
        assert!(answer("y\n").0);
        assert!(answer("YES\n").0);
        assert!(answer("  yes  \n").0);
    }

    #[test]
    fn rejects_no_variants() {
        assert!(!answer("n\n").0);
        assert!(!answer("No\n").0);
    }

    #[test]
    fn end_of_input_means_no() {
        assert!(!answer("").0);
    }

    #[test]
    fn reasks_on_invalid_reply() {
        let (yes, output) = answer("maybe\ny\n");
        assert!(yes);
        assert!(output.contains("Invalid reply \"maybe\""));
        assert_eq!(output.matches("[y/n]?").count(), 2);
    }

    #[test]
    fn prompt_names_destination() {
        let (_, output) = answer("n\n");
        assert!(output.contains("/nonexistent/dst/..."));
    }

    #[test]
    fn mock_confirm_can_refuse() {
        let mut mock = MockConfirm::new();
        mock.expect_confirm().times(1).returning(|_| false);
        assert!(!mock.confirm(&VPath::new("/nonexistent")));
    }
}
