//! Once-only tracing setup for tests.

use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

/// Initializes a `tracing` subscriber for test output.
///
/// Safe to call from every test; only the first call installs the
/// subscriber. Honors `RUST_LOG`, defaulting to `debug` for the harness
/// crates so lifecycle transitions show up in failing-test output.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mockrun=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}
