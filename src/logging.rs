//! Diagnostic logging to stderr
//!
//! Controlled by `RECIPECTL_LOG` using `EnvFilter` directives
//! (e.g. `RECIPECTL_LOG=recipectl=debug`). Defaults to `warn`.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RECIPECTL_LOG";

const DEFAULT_DIRECTIVE: &str = "warn";

/// Install the global subscriber; a second call is a no-op
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
