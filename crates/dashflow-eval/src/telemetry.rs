//! Tracing setup for hosts that do not install their own subscriber.
//!
//! Spans are only emitted when the crate is built with the `tracing` feature;
//! without it these helpers are no-ops.

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"dashflow_eval=debug"`).
///
/// Returns `false` when a global subscriber was already installed.
#[cfg(feature = "tracing")]
pub fn init_tracing(default_filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(not(feature = "tracing"))]
pub fn init_tracing(_default_filter: &str) -> bool {
    false
}
