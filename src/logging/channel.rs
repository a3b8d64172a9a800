//! Sorting tracing events into the kinds of output a stow run produces.
use tracing::{Event, Level, Metadata};

/// Target of stage headers written by [`Log::stage`](super::Log::stage).
pub const STAGE_TARGET: &str = "pstow::stage";

/// Target of the links a dry run would create, written by
/// [`Log::dry_run`](super::Log::dry_run).
pub const DRY_RUN_TARGET: &str = "pstow::dry_run";

/// What an event means to someone watching a stow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Channel {
    /// A pipeline phase begins.
    Stage,
    /// A link that a dry run would create.
    Planned,
    /// Ordinary progress: created links, the rendered tree, the report.
    Info,
    /// Something was skipped.
    Warning,
    /// Something failed.
    Error,
    /// Debug and trace detail.
    Detail,
}

impl Channel {
    pub(super) fn of(metadata: &Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warning,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::Planned,
            (Level::INFO, _) => Self::Info,
            _ => Self::Detail,
        }
    }

    /// Console rendering of `msg`, with colour.
    pub(super) fn console_line(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m::\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::Planned => format!("  \x1b[36m[dry run]\x1b[0m {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Warning => format!("\x1b[33mwarning:\x1b[0m {msg}"),
            Self::Error => format!("\x1b[1;31merror:\x1b[0m {msg}"),
            Self::Detail => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    /// Short tag written in front of every log file line.
    pub(super) const fn file_tag(self) -> &'static str {
        match self {
            Self::Stage => "stage",
            Self::Planned => "plan",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error => "error",
            Self::Detail => "debug",
        }
    }
}

/// The `message` field of `event`, or an empty string.
pub(super) fn message(event: &Event<'_>) -> String {
    struct Message(String);

    impl tracing::field::Visit for Message {
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            if field.name() == "message" {
                value.clone_into(&mut self.0);
            }
        }

        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    let mut visitor = Message(String::new());
    event.record(&mut visitor);
    visitor.0
}
