//! Logging configuration
//!
//! Logs go to stderr so stdout stays free for command output
//! (the persisted deployment / release records).

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::PluginError;

/// Log level configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(PluginError::ConfigError(format!("invalid log level: {}", s))),
        }
    }
}

/// Logging options
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub log_level: LogLevel,

    /// Emit one JSON object per line instead of human readable output
    pub json_format: bool,
}

/// Initialize logging
///
/// The returned guard flushes the background writer on drop; keep it alive
/// for the lifetime of the process.
pub fn init_logging(options: LogOptions) -> Result<WorkerGuard, PluginError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.log_level.as_filter()));

    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    let registry = tracing_subscriber::registry().with(filter);

    let result = if options.json_format {
        registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(writer))
            .try_init()
    };
    result.map_err(|e| PluginError::ConfigError(e.to_string()))?;

    Ok(guard)
}
