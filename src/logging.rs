//! Logging utilities for structured tracing

use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Track operation timing and log on drop
pub struct Timer {
    start: Instant,
    operation: String,
}

impl Timer {
    /// Create a new timer for an operation
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.into(),
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration_ms = self.start.elapsed().as_millis() as u64;
        tracing::debug!(
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }
}

/// Log an error with structured context
pub fn log_error(operation: &str, error: &impl std::error::Error) {
    tracing::error!(
        operation = %operation,
        error = %error,
        error_kind = std::any::type_name_of_val(error),
        "Operation failed"
    );
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slack_hub_relay=debug,slack_morphism=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true)
            .init();
    }
}
