//! Tracing bootstrap.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies. The
/// audit channel (`target: "audit"`) rides the same subscriber, so a SIEM
/// shipper can filter on the target.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}
