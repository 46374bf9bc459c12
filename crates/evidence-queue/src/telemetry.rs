//! Process-wide logging setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::TelemetryError;

/// `RUST_LOG` when set, otherwise the configured directive.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Installs the global subscriber and routes `log` records through it.
///
/// Fails instead of panicking when called a second time. The `log` bridge
/// goes in first, so a second call fails before touching the subscriber. If
/// another subscriber was installed elsewhere, the bridge stays and forwards
/// into that one.
pub fn init(config: &LoggingConfig) -> Result<(), TelemetryError> {
    tracing_log::LogTracer::init()?;

    let registry = tracing_subscriber::registry().with(env_filter(&config.filter));
    if config.json {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))?;
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer()))?;
    }

    tracing::debug!(filter = %config.filter, json = config.json, "Logging initialised");
    Ok(())
}
