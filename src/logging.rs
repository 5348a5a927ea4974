use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TrackerConfig;

/// Installs the global tracing subscriber for an embedding application.
///
/// `RUST_LOG` wins over the configured filter when set. Calling this twice
/// is harmless: the second registration is ignored.
pub fn init_tracing(config: &TrackerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_filter.as_str().into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
