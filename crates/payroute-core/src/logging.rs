//! Tracing subscriber setup shared by binaries and tests.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::CoreError;

/// Install a global fmt subscriber according to `config`.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed, so tests may ignore the error.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), CoreError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = match config.format.as_str() {
        "json" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init(),
        "text" => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        other => {
            return Err(CoreError::InvalidConfig(format!(
                "unknown log format: {}",
                other
            )))
        }
    };

    result.map_err(|e| CoreError::Logging(e.to_string()))
}
