use tracing_subscriber::EnvFilter;

use crate::system::config::LogConfig;

/// Installs the global `tracing` subscriber. `RUST_LOG` takes precedence over
/// the configured level. Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &LogConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
