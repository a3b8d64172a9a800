//! The per-command log file under the user's cache directory.
use std::borrow::Cow;
use std::fs;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use super::channel::{self, Channel};

/// Where the log of `command` lives: `$XDG_CACHE_HOME/pstow/<command>.log`,
/// falling back to `~/.cache`. The `pstow` directory is created on demand.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let cache = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var_os("HOME")
                .or_else(|| std::env::var_os("USERPROFILE"))
                .map(|home| PathBuf::from(home).join(".cache"))
        })
        .unwrap_or_else(|| PathBuf::from(".cache"));
    let dir = cache.join("pstow");
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// A [`tracing_subscriber::Layer`] writing every event it sees to the log
/// file of one command, one timestamped line per event with colours removed.
///
/// The file is truncated when the layer is created, so it only ever holds the
/// latest run.
#[derive(Debug)]
pub(super) struct LogFile {
    out: Mutex<fs::File>,
}

impl LogFile {
    /// Start a fresh log for `command`.
    ///
    /// Returns `None` when the cache directory or the file cannot be created;
    /// the run then goes on with console output only.
    pub(super) fn create(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let mut file = fs::File::create(&path).ok()?;
        let version = option_env!("PSTOW_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        let started = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        writeln!(file, "# pstow {version} {command}, started {started}").ok()?;
        Some(Self {
            out: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogFile {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let tag = Channel::of(event.metadata()).file_tag();
        let message = channel::message(event);
        let time = chrono::Utc::now().format("%H:%M:%S");
        if let Ok(mut out) = self.out.lock() {
            writeln!(out, "{time} {tag:<5} {}", strip_ansi(&message)).ok();
        }
    }
}

/// Remove ANSI escape sequences, such as the colours of the rendered tree.
///
/// A CSI sequence (`ESC [`) runs up to its final byte in `@..=~`; any other
/// escape swallows exactly one following character.
pub(super) fn strip_ansi(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\x1b' {
            plain.push(c);
        } else if chars.next_if_eq(&'[').is_some() {
            for _ in chars.by_ref().take_while(|c| !('@'..='~').contains(c)) {}
        } else {
            chars.next();
        }
    }
    Cow::Owned(plain)
}
