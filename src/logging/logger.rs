//! [`Log`] implementation forwarding to the global tracing subscriber.
use std::path::{Path, PathBuf};

use super::channel::{DRY_RUN_TARGET, STAGE_TARGET};
use super::file::log_file_path;
use super::types::Log;

/// The logger handed to a stow run.
///
/// Messages reach the console and the command's log file through whatever
/// subscriber [`init_subscriber`](super::init_subscriber) installed.
#[derive(Debug)]
pub struct Logger {
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Logger for `command`. Only remembers where the log file is; the file
    /// itself belongs to the subscriber.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            log_file: log_file_path(command),
        }
    }

    /// The log file of this command, if the cache directory is usable.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Mention the log file at debug level, at the end of a run.
    pub fn print_log_location(&self) {
        if let Some(path) = self.log_path() {
            self.debug(&format!("full log: {}", path.display()));
        }
    }
}

impl Log for Logger {
    fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }
}
