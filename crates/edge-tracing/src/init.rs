//! Subscriber installation.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, TracingConfig};

/// Initialize the global tracing subscriber with an env filter and a stderr
/// fmt layer.
///
/// An unparsable `log_level` falls back to `info`. Calling this twice is a
/// no-op for the second call, so tests and embedders can call it freely.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match config.format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(
            log_level = %config.log_level,
            format = ?config.format,
            "Tracing initialized"
        );
    }
}
