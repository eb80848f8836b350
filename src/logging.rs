//! Tracing setup for applications embedding docnode.
//!
//! The library only emits events (node failures it swallows go out at
//! `debug`/`warn` with `operation` and `reference` fields). Nothing is
//! installed unless the caller asks: [`init_tracing`] or
//! [`init_tracing_from_settings`] put a global subscriber in place with a
//! stdout sink and, optionally, a non-blocking file sink. Both sinks share
//! one format (compact or JSON) with local `DD/MM/YY HH:MM:SS` timestamps.

use anyhow::Result;
use chrono::Local;
use std::fmt as stdfmt;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{Layer, Registry, registry};

use crate::config::{LogLevel, Settings, path_has_symlink_ancestor};
use crate::platform::open_log_file_secure_append;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Local timestamp, e.g. `14/03/25 09:26:53`.
pub struct LocalHumanTime;

impl FormatTime for LocalHumanTime {
    fn format_time(&self, w: &mut tsfmt::format::Writer<'_>) -> stdfmt::Result {
        write!(w, "{}", Local::now().format("%d/%m/%y %H:%M:%S"))
    }
}

/// Quiet shows errors only; each step up adds one level of detail.
#[inline]
pub fn to_level_filter(lvl: &LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Quiet => LevelFilter::ERROR,
        LogLevel::Normal => LevelFilter::INFO,
        LogLevel::Info => LevelFilter::DEBUG,
        LogLevel::Debug => LevelFilter::TRACE,
    }
}

fn format_layer<W>(writer: W, json: bool, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tsfmt::layer()
        .with_writer(writer)
        .with_timer(LocalHumanTime)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(ansi);
    if json {
        layer.json().boxed()
    } else {
        layer.compact().boxed()
    }
}

/// Non-blocking file writer for logging, or `None` (with a reason on
/// stderr) when any ancestor is a symlink or the file cannot be opened.
pub fn maybe_open_non_blocking_writer(path: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    match path_has_symlink_ancestor(path) {
        Ok(false) => {}
        Ok(true) => {
            eprintln!(
                "Refusing file logging to {}: an ancestor directory is a symlink.",
                path.display()
            );
            return None;
        }
        Err(e) => {
            eprintln!("Cannot check log path {} for symlinks: {e}", path.display());
            return None;
        }
    }

    match open_log_file_secure_append(path) {
        Ok(file) => Some(tracing_appender::non_blocking(file)),
        Err(e) => {
            eprintln!("Failed to open log file {}: {e}", path.display());
            None
        }
    }
}

/// Install the global subscriber. Returns the file sink's guard, which must
/// be held until shutdown so buffered lines are flushed. Fails if a global
/// subscriber is already set. A file sink that cannot be opened is skipped
/// with a note on stderr; stdout logging still goes ahead.
pub fn init_tracing(
    lvl: &LogLevel,
    log_file: Option<&Path>,
    json: bool,
) -> Result<Option<WorkerGuard>> {
    let mut layers: Vec<BoxedLayer> = vec![format_layer(io::stdout, json, true)];
    let mut guard = None;

    if let Some(path) = log_file {
        match maybe_open_non_blocking_writer(path) {
            Some((writer, file_guard)) => {
                layers.push(format_layer(writer, json, false));
                guard = Some(file_guard);
            }
            None => eprintln!("File logging to '{}' disabled; stdout only.", path.display()),
        }
    }

    let filter = EnvFilter::builder()
        .with_default_directive(to_level_filter(lvl).into())
        .parse_lossy("");
    registry().with(layers).with(filter).try_init()?;
    Ok(guard)
}

/// [`init_tracing`] with the level and log file from loaded settings.
pub fn init_tracing_from_settings(settings: &Settings, json: bool) -> Result<Option<WorkerGuard>> {
    init_tracing(&settings.log_level, settings.log_file.as_deref(), json)
}
