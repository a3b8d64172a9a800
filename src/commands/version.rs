//! Command: print version information.
use std::io::{self, Write};

/// Version string: `PSTOW_VERSION` at build time, or the crate version.
#[must_use]
pub const fn version() -> &'static str {
    match option_env!("PSTOW_VERSION") {
        Some(version) => version,
        None => env!("CARGO_PKG_VERSION"),
    }
}

/// Print the pstow version to `out`.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn run(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "pstow {}", version())
}
