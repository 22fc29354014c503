//! Tracing subscriber setup
//!
//! Logs always go to stderr: `serve` uses stdout for the wire protocol and
//! `run --json` uses it for the report. `RUST_LOG`, when set, overrides the
//! configured level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::{LogFormat, LogSettings};

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

/// Build the filter from `RUST_LOG`, falling back to `level`.
pub fn env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        directive: level.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
pub fn init(settings: &LogSettings) -> Result<(), LoggingError> {
    let filter = env_filter(&settings.level)?;

    let layer = match settings.format {
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_directive_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = env_filter("armfake=notalevel").unwrap_err();
        assert!(matches!(err, LoggingError::InvalidFilter { .. }));
    }

    #[test]
    fn test_second_init_fails() {
        let settings = LogSettings::default();
        let _ = init(&settings);
        assert!(matches!(init(&settings), Err(LoggingError::AlreadyInstalled)));
    }
}
