//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber
///
/// Filter directives come from `RUST_LOG` when set, otherwise from
/// `config.filter`; invalid directives fall back to `info`. Returns `false`
/// when a global subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(filter = %config.filter, json = config.json, "tracing initialized");
            true
        }
        Err(_) => false,
    }
}
