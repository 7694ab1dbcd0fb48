//! Logging setup helpers.
//!
//! The library itself only emits `tracing` events; embedding
//! applications decide where they go. These helpers cover the common
//! case of a standalone binary or test harness that wants sensible
//! defaults.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber reading its filter from
/// `RUST_LOG` (defaulting to `info`).
///
/// Safe to call more than once: if a subscriber is already installed,
/// this is a no-op.
pub fn init_tracing() {
    init_tracing_with_filter("info");
}

/// Installs a global `tracing` subscriber with an explicit default
/// filter, still overridable via `RUST_LOG`.
pub fn init_tracing_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        init_tracing_with_filter("debug");
        // Repeated installation must not panic.
    }
}
