//! Link (or, for `status`, preview linking) the source tree into the target.
use anyhow::{Context as _, Result, bail};
use std::process::ExitCode;

use crate::cli::GlobalOpts;
use crate::logging::Log;
use crate::prompt::{Confirm, StdinPrompt};
use crate::stower::StowOutcome;

/// Run the stow pipeline with an interactive stdin prompt.
///
/// An empty source tree is not an error: the pipeline warns about it and the
/// run yields [`ExitCode::FAILURE`].
///
/// # Errors
///
/// Returns an error if setup fails, the pipeline refuses to run, or any link
/// could not be created.
pub fn run(global: &GlobalOpts, dry_run: bool, log: &dyn Log) -> Result<ExitCode> {
    run_with(global, dry_run, log, &StdinPrompt)
}

/// Run the stow pipeline with the given confirmation oracle.
///
/// # Errors
///
/// Same as [`run`].
pub fn run_with(
    global: &GlobalOpts,
    dry_run: bool,
    log: &dyn Log,
    confirm: &dyn Confirm,
) -> Result<ExitCode> {
    let setup = super::RunSetup::init(global, dry_run, log)?;
    let source = setup.source.clone();
    let stower = setup.into_stower();

    let outcome = stower
        .stow(log, confirm)
        .with_context(|| format!("Failed to stow {source}"))?;

    match outcome {
        // The pipeline has already warned about the empty source.
        StowOutcome::Empty => Ok(ExitCode::FAILURE),
        StowOutcome::Aborted => Ok(ExitCode::SUCCESS),
        StowOutcome::DryRun(report) | StowOutcome::Linked(report) => {
            if report.failed > 0 {
                bail!("{} link(s) failed", report.failed);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
