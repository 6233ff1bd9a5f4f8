//! Subscriber setup for the `tracing` events the store emits
//!
//! Needs the `logging` feature; without it every function is a no-op.

#[cfg(feature = "logging")]
use tracing_subscriber::{EnvFilter, fmt};

/// Installs a stderr subscriber at `info`. `RUST_LOG` overrides the level.
///
/// ```rust
/// sqlkv_core::logging::init();
/// ```
#[cfg(feature = "logging")]
pub fn init() {
    init_with_level("info")
}

/// Same as [`init`] with a caller-chosen default filter. A second call is ignored.
#[cfg(feature = "logging")]
pub fn init_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}

/// `debug` for this crate only, written through the test harness.
#[cfg(feature = "logging")]
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("sqlkv_core=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init() {}

#[cfg(not(feature = "logging"))]
pub fn init_with_level(_level: &str) {}

#[cfg(not(feature = "logging"))]
pub fn init_test() {}
