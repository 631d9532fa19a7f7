//! Logging setup
//!
//! Library code only emits `tracing` events. Embedding applications call
//! [`init`] once to print them to stderr.

use crate::config::LoggingConfig;
use crate::error::{AssayError, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a stderr subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| AssayError::Config(format!("invalid log level '{}': {e}", config.level)))?,
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| AssayError::Config(format!("logging already initialized: {e}")))?;

    tracing::debug!(level = %config.level, "Logging initialized");
    Ok(())
}

/// Initialize logging for tests
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
