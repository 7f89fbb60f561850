//! Tracing/logging setup shared by binaries and integration tests.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize human-readable tracing for tests (captured by the test harness).
pub fn init_for_tests() {
    tracing::init_test();
}
