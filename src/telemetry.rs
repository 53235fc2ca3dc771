//! Process-wide logging setup.
//!
//! No metrics or trace export backend is wired up here; just structured,
//! level-filtered output to stdout via `tracing-subscriber`. `RUST_LOG`
//! controls verbosity (defaults to `info`).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initializes the global `tracing` subscriber.
///
/// Safe to call once at process startup; a second call would panic, same
/// as the underlying `tracing_subscriber::registry().init()`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "logging initialized"
    );
}
