//! Telemetry initialisation for embedding applications.
//!
//! Lightweight setup: structured JSON logs only. The library itself never
//! initialises a subscriber; hosts that want the crate's warn/debug events
//! (legacy-format migration nudges, development-build failure detail) call
//! [`init`] once at startup.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the tracing subscriber.
///
/// Outputs structured JSON logs to stdout at the configured log level;
/// `RUST_LOG` takes precedence when set.
///
/// # Errors
///
/// Returns an error if a subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
