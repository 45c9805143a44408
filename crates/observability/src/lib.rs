//! Tracing and logging setup shared by every stockgate binary and test harness.

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::ObservabilityConfig;

/// Initialize process-wide tracing with JSON output and `RUST_LOG` filtering.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    self::tracing::init();
}

/// Initialize process-wide tracing from explicit configuration.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_with(config: &ObservabilityConfig) -> bool {
    self::tracing::init_with(config)
}
