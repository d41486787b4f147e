//! Structured logging with tracing

use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Result, ScopixError};

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "SCOPIX_LOG";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ScopixError::config(format!("invalid log filter {:?}: {e}", config.level)))?;

    let registry = Registry::default().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(true))
            .try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).try_init(),
    };
    installed.map_err(|e| ScopixError::config(format!("failed to install tracing subscriber: {e}")))?;

    tracing::info!(level = %config.level, format = %config.format, "logging initialized");
    Ok(())
}
