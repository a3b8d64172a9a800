//! pstow command-line entry point.

use anyhow::{Context as _, Result};
use clap::Parser;
use std::process::ExitCode;

use pstow::cli::{Cli, Command};
use pstow::commands;
use pstow::logging::{self, Log as _};

fn main() -> Result<ExitCode> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.verbose, args.command_name());
    let log = logging::Logger::new(args.command_name());

    ctrlc::set_handler(|| {
        tracing::warn!("Aborting.");
        std::process::exit(130);
    })
    .context("Failed to install interrupt handler")?;

    let result = match args.command {
        None => commands::stow::run(&args.global, false, &log),
        Some(Command::Status) => commands::stow::run(&args.global, true, &log),
        Some(Command::Completions { shell }) => {
            commands::completions::run(shell, &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Version) => commands::version::run(&mut std::io::stdout())
            .context("Failed to write version")
            .map(|()| ExitCode::SUCCESS),
    };

    log.print_log_location();
    Ok(result.unwrap_or_else(|err| {
        log.error(&format!("{err:#}"));
        ExitCode::FAILURE
    }))
}
