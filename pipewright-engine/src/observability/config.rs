//! Logging configuration.

use std::env;
use std::io::IsTerminal;
use std::str::FromStr;

/// Selects the output format.
pub const LOG_FORMAT_ENV: &str = "PIPEWRIGHT_LOG_FORMAT";

/// `true` or `1` adds file and line to every event.
pub const LOG_LOCATION_ENV: &str = "PIPEWRIGHT_LOG_LOCATION";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Multi-line, colored.
    Pretty,
    /// One line per event.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Subscriber settings for [`init_tracing`](super::init_tracing).
///
/// Events always go to stderr; stdout carries generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    format: LogFormat,
    filter: String,
    location: bool,
}

impl TracingConfig {
    /// Compact output with the given filter directive.
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            format: LogFormat::Compact,
            filter: filter.into(),
            location: false,
        }
    }

    /// Settings from the environment.
    ///
    /// `RUST_LOG` replaces `default_filter` when set. The format comes from
    /// [`log_format_from_env`] and source locations from
    /// `PIPEWRIGHT_LOG_LOCATION`.
    pub fn from_env(default_filter: &str) -> Self {
        let filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());
        let location = env::var(LOG_LOCATION_ENV).is_ok_and(|v| v == "true" || v == "1");
        Self::new(filter)
            .with_format(log_format_from_env())
            .with_location(location)
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Include file and line in events.
    pub fn with_location(mut self, location: bool) -> Self {
        self.location = location;
        self
    }

    /// Output format.
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Filter directive, e.g. `warn,pipewright_engine=debug`.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Whether events carry file and line.
    pub fn location(&self) -> bool {
        self.location
    }
}

/// Format named by `PIPEWRIGHT_LOG_FORMAT`, else pretty on a terminal and
/// compact otherwise.
pub fn log_format_from_env() -> LogFormat {
    let value = env::var(LOG_FORMAT_ENV).ok();
    resolve_format(value.as_deref(), std::io::stderr().is_terminal())
}

/// Unset or unparsable values fall back on the terminal check.
fn resolve_format(value: Option<&str>, terminal: bool) -> LogFormat {
    match value.map(str::parse::<LogFormat>) {
        Some(Ok(format)) => format,
        Some(Err(_)) | None if terminal => LogFormat::Pretty,
        Some(Err(_)) | None => LogFormat::Compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_format() {
        assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!(" pretty ".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("garbage".parse::<LogFormat>().is_err());
    }

    #[test]
    fn unknown_format_falls_back_on_terminal() {
        assert_eq!(resolve_format(Some("json"), true), LogFormat::Json);
        assert_eq!(resolve_format(Some("garbage"), true), LogFormat::Pretty);
        assert_eq!(resolve_format(Some("garbage"), false), LogFormat::Compact);
        assert_eq!(resolve_format(None, true), LogFormat::Pretty);
        assert_eq!(resolve_format(None, false), LogFormat::Compact);
    }

    #[test]
    fn settings_chain() {
        let config = TracingConfig::new("debug")
            .with_format(LogFormat::Json)
            .with_location(true);
        assert_eq!(config.format(), LogFormat::Json);
        assert_eq!(config.filter(), "debug");
        assert!(config.location());
        assert!(!TracingConfig::new("warn").location());
    }
}
