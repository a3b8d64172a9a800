//! The [`Log`] trait through which a stow run reports what it does.

/// Sink for the messages of a stow run.
///
/// The pipeline announces each phase with `stage`, prints the rendered tree
/// and the link report with `info`, and reports every link decision: created
/// links with `info`, refused destinations with `warn`, failures with `error`
/// and, in a dry run, the links it would create with `dry_run`.
pub trait Log: Send + Sync {
    /// A pipeline phase begins.
    fn stage(&self, msg: &str);
    /// Progress worth showing by default.
    fn info(&self, msg: &str);
    /// Detail shown only when verbose.
    fn debug(&self, msg: &str);
    /// Something was skipped.
    fn warn(&self, msg: &str);
    /// Something failed.
    fn error(&self, msg: &str);
    /// A link that a dry run would create.
    fn dry_run(&self, msg: &str);
}
