//! Global subscriber: coloured console output plus the log file.
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::registry::LookupSpan;

use super::channel::{self, Channel};
use super::file::LogFile;

/// Environment variable holding an optional [`EnvFilter`] directive for the
/// console, e.g. `PSTOW_LOG=pstow::stowconfig=debug`.
///
/// [`EnvFilter`]: tracing_subscriber::EnvFilter
pub const LOG_ENV: &str = "PSTOW_LOG";

/// Console layout: one line per event, styled by its [`Channel`].
struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let line = Channel::of(event.metadata()).console_line(&channel::message(event));
        writeln!(writer, "{line}")
    }
}

/// Install the global subscriber for one invocation of `command`.
///
/// Warnings and errors go to stderr, everything else to stdout. The console
/// shows info and up, or debug and up with `verbose`; [`LOG_ENV`] overrides
/// either. The log file of `command` always receives debug and up.
///
/// Call once, before anything is logged.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let console_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy();
    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_writer(
            std::io::stderr
                .with_max_level(tracing::Level::WARN)
                .or_else(std::io::stdout),
        )
        .with_filter(console_filter);

    let file = LogFile::create(command).map(|layer| layer.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry().with(console).with(file).init();
}
