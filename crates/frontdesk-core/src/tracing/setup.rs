//! Tracing initialization and configuration.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the front-desk tracing/logging system.
///
/// Reads the `FRONTDESK_LOG` environment variable for per-module log levels.
/// Format: `FRONTDESK_LOG=frontdesk_storage=debug,frontdesk_cli=info`
///
/// Falls back to `info` for the frontdesk crates if `FRONTDESK_LOG` is not
/// set or invalid.
/// Calling it more than once is a no-op.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("FRONTDESK_LOG")
            .unwrap_or_else(|_| {
                EnvFilter::new("frontdesk_core=info,frontdesk_storage=info,frontdesk_cli=info")
            });

        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init();
    });
}
