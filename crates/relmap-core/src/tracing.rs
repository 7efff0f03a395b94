//! Subscriber setup for binaries and tests that use relmap.
//!
//! Library code only emits events through the `tracing` macros; installing
//! a subscriber is left to the host process.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "RELMAP_LOG";

static INIT: Once = Once::new();

/// Install a fmt subscriber filtered by `RELMAP_LOG` (default `info`).
/// Safe to call more than once; only the first call takes effect.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
        // A host may already have installed a global subscriber.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
