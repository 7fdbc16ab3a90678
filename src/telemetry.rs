//! Tracing setup for hosts and tests.
//!
//! The engine logs through [`tracing`]; it never installs a subscriber on
//! its own. Hosts that don't bring their own subscriber can call
//! [`init`] once at startup for a sensible console default honoring
//! `RUST_LOG`.

use tracing_subscriber::EnvFilter;

/// Installs a console subscriber filtered by `RUST_LOG` (default
/// `info`). Safe to call more than once; later calls are no-ops.
pub fn init() {
    init_with_filter("info");
}

/// Installs a console subscriber with the given default filter, still
/// overridable through `RUST_LOG`.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
