//! Tracing/logging initialization.
//!
//! JSON lines on stdout. `RUST_LOG` overrides the default directive, e.g.
//! `RUST_LOG=maison_infra=debug,info`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(true)
        .try_init();
}
