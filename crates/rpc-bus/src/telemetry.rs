//! Log subscriber setup and the runtime debug toggle.
//!
//! Routine flow is logged at `debug`, dropped frames and fields at `warn`,
//! handler faults at `error`. Per-frame parameter dumps are only emitted while
//! the debug toggle is on, whatever the subscriber's filter.

use crate::config::LoggingConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("failed to install subscriber: {0}")]
    SubscriberInit(String),
}

/// Install a global `fmt` subscriber filtered by `config.log_level`.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;
    }

    tracing::debug!(
        log_level = %config.log_level,
        json = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Turn on per-frame diagnostics.
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::Relaxed);
}

pub fn disable_debug() {
    DEBUG_ENABLED.store(false, Ordering::Relaxed);
}

#[must_use]
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}
