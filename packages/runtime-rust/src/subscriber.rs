//! Global `tracing` subscriber installation.
//!
//! Production environments get one flat JSON object per line
//! ([`FlatJsonFormat`]); `dev` gets the human-readable formatter. `RUST_LOG` overrides the configured level.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggerConfig};
use crate::format::FlatJsonFormat;

/// Errors from [`init_subscriber`].
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("a global tracing subscriber is already installed")]
    AlreadySet(#[from] tracing_subscriber::util::TryInitError),
}

/// Filter directive derived from the configured minimum level.
#[must_use]
pub fn default_directive(config: &LoggerConfig) -> String {
    let level = match config.level {
        aloig_core::Level::Trace => "trace",
        aloig_core::Level::Debug => "debug",
        aloig_core::Level::Info => "info",
        aloig_core::Level::Warn => "warn",
        aloig_core::Level::Error | aloig_core::Level::Fatal | aloig_core::Level::Panic => "error",
    };
    level.to_string()
}

/// Installs the process-wide subscriber for `config`.
///
/// # Errors
///
/// Returns [`InitError::AlreadySet`] if another subscriber was installed first.
pub fn init_subscriber(config: &LoggerConfig) -> Result<(), InitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    match config.format() {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().event_format(FlatJsonFormat))
            .try_init()?,
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()?,
    }

    tracing::debug!(
        environment = %config.environment,
        format = ?config.format(),
        "tracing subscriber installed"
    );
    Ok(())
}
