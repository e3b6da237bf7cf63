//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize structured JSON logging for the process, filtered via
/// `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    init_with_filter(default_filter());
}

/// Like [`init`] but with an explicit filter, for tests and tools that want
/// a level other than the environment's.
pub fn init_with_filter(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}
