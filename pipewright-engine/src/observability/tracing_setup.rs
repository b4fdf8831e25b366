//! Subscriber installation.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use super::config::{LogFormat, TracingConfig};

/// Returned by [`init_tracing`]; hold it for the lifetime of the program.
#[must_use]
pub struct TracingGuard {
    _private: (),
}

/// Install the global subscriber.
///
/// An invalid filter directive falls back to `info`. Fails if a subscriber
/// is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<TracingGuard> {
    let filter = EnvFilter::try_new(config.filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let location = config.location();

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format() {
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .with_file(location)
            .with_line_number(location)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_file(location)
            .with_line_number(location)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_file(location)
            .with_line_number(location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    tracing::debug!(format = ?config.format(), filter = config.filter(), "Logging initialized");
    Ok(TracingGuard { _private: () })
}
