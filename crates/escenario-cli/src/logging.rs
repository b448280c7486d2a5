//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::Verbosity;

/// Filter from `RUST_LOG` when set, otherwise from the verbosity level
#[must_use]
pub fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()))
}

/// Install a compact stderr subscriber; later calls are ignored
pub fn init_logging(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity.is_verbose())
        .compact()
        .try_init();
}
