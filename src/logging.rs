//! Log line format and sinks.
//!
//! Each event becomes one line, written to stdout and appended to the log
//! file:
//!
//! ```text
//! 2026-10-14 09:12:44,031 - INFO - IP: 203.0.113.5 - Blocking range: 203.0.113.0/24
//! ```
//!
//! The address comes from the event's `ip` field; events without one are
//! tagged `N/A`. The subscriber is installed with
//! [`tracing::subscriber::set_default`] and lives as long as the returned
//! [`LogScope`].

use anyhow::{Context, Result};
use chrono::Local;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{warn, Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

/// Tag used when an event is not about a specific address
pub const NO_IP: &str = "N/A";

/// `<timestamp> - <LEVEL> - IP: <ip> - <message>`
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = EntryFields::default();
        event.record(&mut fields);

        writeln!(
            writer,
            "{} - {} - IP: {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level_name(event.metadata().level()),
            fields.ip.as_deref().unwrap_or(NO_IP),
            fields.text()
        )
    }
}

fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARNING",
        Level::ERROR => "ERROR",
    }
}

/// Fields pulled out of one event
#[derive(Default)]
struct EntryFields {
    message: String,
    ip: Option<String>,
    extra: Vec<String>,
}

impl Visit for EntryFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "ip" => self.ip = Some(value.to_string()),
            "message" => self.message = value.to_string(),
            _ => self.record_extra(field, &value),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "ip" => self.ip = Some(format!("{:?}", value)),
            "message" => self.message = format!("{:?}", value),
            _ => self.record_extra(field, value),
        }
    }
}

impl EntryFields {
    // Any other field is appended to the message as key=value
    fn record_extra(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.extra.push(format!("{}={:?}", field.name(), value));
    }

    fn text(&self) -> String {
        let mut text = self.message.clone();
        for extra in &self.extra {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(extra);
        }
        text
    }
}

/// Build the dual-sink subscriber.
///
/// `console` receives every line; `file`, when present, receives the same
/// lines.
pub fn build_subscriber<C, F>(
    level: Level,
    console: C,
    file: Option<F>,
) -> impl Subscriber + Send + Sync + 'static
where
    C: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    F: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(console),
        )
        .with(file.map(|writer| {
            tracing_subscriber::fmt::layer()
                .event_format(LineFormat)
                .with_ansi(false)
                .with_writer(writer)
        }))
}

/// Open the log file for appending, creating it if needed
pub fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

/// Keeps the subscriber installed; logging stops when this is dropped.
pub struct LogScope {
    _guard: DefaultGuard,
}

/// Install the stdout + file subscriber for the current thread.
///
/// A log file that cannot be opened is not fatal: logging continues on
/// stdout and a warning line records why.
pub fn init(path: &Path, level: Level) -> LogScope {
    let (file, open_error) = match open_log_file(path) {
        Ok(file) => (Some(Mutex::new(file)), None),
        Err(e) => (None, Some(e)),
    };

    let guard = tracing::subscriber::set_default(build_subscriber(level, std::io::stdout, file));

    if let Some(e) = open_error {
        warn!("{:#}. Logging to stdout only.", e);
    }

    LogScope { _guard: guard }
}
