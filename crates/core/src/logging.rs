//! Structured logging infrastructure for AuthCoin.
//!
//! Centralized logging initialization driven by the `[logging]` config
//! section, with structured JSON output and `RUST_LOG` overrides.

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize from the `[logging]` section, writing to stderr. `RUST_LOG`
/// still wins when set; otherwise `config.level` applies.
///
/// # Example
/// ```no_run
/// use authcoin_core::{logging, LoggingConfig};
///
/// logging::init_from_config(&LoggingConfig::default());
/// tracing::info!("Registry started");
/// ```
pub fn init_from_config(config: &LoggingConfig) {
    let filter = env_filter(&config.level);
    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr).with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .init();
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_doesnt_panic() {
        // Subscribers can only be installed once per process
        let _ = env_filter("debug");
        let _ = env_filter("authcoin_registry=trace");
    }
}
