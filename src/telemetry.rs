//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.
//! Level and format come from the validated configuration snapshot.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

static INIT: Once = Once::new();

/// Initialize the tracing subscriber for structured logging
///
/// This can only be called once per process; subsequent calls are
/// silently ignored. `RUST_LOG` overrides the configured level.
pub fn init(logging: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "aialpha_backend={},tower_http=debug",
                logging.level.as_str()
            ))
        });

        match logging.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init(),
            LogFormat::Simple => tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init(),
        }
    });
}
