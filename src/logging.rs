//! Logging setup
//!
//! Log levels come from `KIT_LOG` (same syntax as `RUST_LOG`), defaulting
//! to `warn`. Output goes to stderr so it never mixes with command output.

use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "KIT_LOG";

/// Install the global subscriber
///
/// `verbose` raises the default level to `debug` when `KIT_LOG` is unset.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Subscriber for tests, captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
