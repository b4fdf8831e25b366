//! Logging setup.
//!
//! `PIPEWRIGHT_LOG_FORMAT` picks the output format (`json`, `pretty` or
//! `compact`). Unset or unknown values mean pretty on a terminal and compact
//! otherwise.
//!
//! ```ignore
//! use pipewright_engine::observability::{TracingConfig, init_tracing};
//!
//! let _guard = init_tracing(TracingConfig::from_env("warn"))?;
//! ```

mod config;
mod tracing_setup;

pub use config::{LOG_FORMAT_ENV, LOG_LOCATION_ENV, LogFormat, TracingConfig, log_format_from_env};
pub use tracing_setup::{TracingGuard, init_tracing};
