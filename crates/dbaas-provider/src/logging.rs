//! Tracing subscriber setup.
//!
//! The filter comes from `RUST_LOG` when set, otherwise from the given default
//! (for example `"dbaas_provider=debug,info"`). Records emitted through the
//! `log` facade are forwarded to the subscriber.

use std::str::FromStr;

use thiserror::Error;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(LoggingError::UnknownFormat(other.to_string())),
        }
    }
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Unknown log format '{0}'")]
    UnknownFormat(String),

    #[error("Failed to install log bridge: {0}")]
    Bridge(#[from] log::SetLoggerError),

    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs a text subscriber, ignoring an already installed one.
pub fn init_logging(default_filter: &str) {
    let _ = try_init_logging(default_filter, LogFormat::Text);
}

/// Installs the global subscriber and the `log` bridge.
pub fn try_init_logging(default_filter: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = env_filter(default_filter);

    match format {
        LogFormat::Text => {
            let subscriber = Registry::default()
                .with(filter)
                .with(fmt::layer().with_target(true));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogFormat::Json => {
            let subscriber = Registry::default()
                .with(filter)
                .with(fmt::layer().json().with_current_span(true));
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    LogTracer::init()?;
    Ok(())
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("TEXT".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(LoggingError::UnknownFormat(_))
        ));
    }

    #[test]
    #[serial]
    fn test_default_filter_without_rust_log() {
        let previous = std::env::var("RUST_LOG").ok();
        std::env::remove_var("RUST_LOG");

        let filter = env_filter("dbaas_provider=debug");
        assert_eq!(filter.to_string(), "dbaas_provider=debug");

        if let Some(value) = previous {
            std::env::set_var("RUST_LOG", value);
        }
    }

    #[test]
    #[serial]
    fn test_second_install_fails() {
        // Another test binary may have installed one already; either way the
        // second call in this process must fail.
        let _ = try_init_logging("warn", LogFormat::Text);
        assert!(try_init_logging("warn", LogFormat::Json).is_err());
        tracing::info!("still logging after a failed install");
    }
}
