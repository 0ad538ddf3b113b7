//! Tracing setup for hosts embedding the controller

use tracing_subscriber::EnvFilter;

use crate::config::DraftkeepConfig;

/// Filter used when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_FILTER: &str = "draftkeep=info";

/// Build the filter: `RUST_LOG` wins, then the config, then the default.
pub fn env_filter(config: &DraftkeepConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = config.log_filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directive).unwrap_or_else(|e| {
            eprintln!("Warning: invalid log_filter '{}': {}", directive, e);
            EnvFilter::new(DEFAULT_FILTER)
        })
    })
}

/// Install a global fmt subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &DraftkeepConfig) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .try_init()
        .is_ok()
}
