//! Logging setup shared by the binary and tests.

/// Initialize process-wide logging from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, format, writer).
pub mod tracing;

pub use self::tracing::{LOG_FORMAT_VAR, LogFormat};
