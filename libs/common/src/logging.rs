//! Logging setup shared by all binaries
//!
//! Console output goes through an `EnvFilter` built from the configured
//! level; an optional file sink rolls daily via `tracing-appender`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::Writer, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::{Error, Result};

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive, e.g. `info` or `aqisrv=debug,info`
    pub level: String,
    /// Enable console output
    pub console: bool,
    /// Optional log file path (rolled daily)
    pub file: Option<String>,
    /// Output format
    pub format: LogFormat,
    /// Enable ANSI colors in console output
    pub ansi: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// `timestamp [LEVEL] message fields`
    #[default]
    Bracketed,
    Pretty,
    Compact,
    Json,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            console: true,
            file: None,
            format: LogFormat::default(),
            ansi: true,
        }
    }
}

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] Published AQI update`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.3fZ"))?;

        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| Error::logging(format!("Invalid log level: {}", e)))
}

/// Initialize logging with the given configuration
///
/// Returns a guard that must be kept alive for file logging to work
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();
    let mut guard = None;

    if config.console {
        let console_layer = match config.format {
            LogFormat::Bracketed => fmt::layer()
                .with_ansi(config.ansi)
                .event_format(BracketedLevelFormat)
                .boxed(),
            LogFormat::Pretty => fmt::layer()
                .pretty()
                .with_ansi(config.ansi)
                .with_target(true)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_ansi(config.ansi)
                .with_target(true)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .boxed(),
        };

        layers.push(console_layer.with_filter(build_filter(&config.level)?).boxed());
    }

    if let Some(file_path) = &config.file {
        let path = Path::new(file_path);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let file_appender = tracing_appender::rolling::daily(
            dir,
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("aqisrv.log"),
        );
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(file_guard);

        let file_layer = match config.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .boxed(),
            _ => fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .event_format(BracketedLevelFormat)
                .boxed(),
        };

        layers.push(file_layer.with_filter(build_filter(&config.level)?).boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| Error::logging(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}
