//! Structured logging utilities.
//!
//! Provides operation timing for startup phases and request-path work,
//! logged through `tracing` with consistent fields.

use std::time::Instant;

/// Operation timer for measuring and logging execution duration.
///
/// Logs the operation start on creation and the duration on
/// [`finish`](OpTimer::finish).
#[derive(Debug)]
pub struct OpTimer {
    /// Component being timed (e.g., "store", "gateway").
    component: String,
    /// Operation being performed (e.g., "init", "claim").
    operation: String,
    /// Start time of the operation.
    start: Instant,
}

impl OpTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(component: impl Into<String>, operation: impl Into<String>) -> Self {
        let component = component.into();
        let operation = operation.into();

        tracing::debug!(
            component = %component,
            operation = %operation,
            "Operation started"
        );

        Self {
            component,
            operation,
            start: Instant::now(),
        }
    }

    /// Finishes the timer and logs the duration.
    pub fn finish(self) {
        let duration_ms = self.start.elapsed().as_millis();

        tracing::info!(
            component = %self.component,
            operation = %self.operation,
            duration_ms = duration_ms,
            "Operation completed"
        );
    }

    /// Finishes the timer with result-aware logging.
    ///
    /// Logs success or error based on the result, including error
    /// context when the operation fails.
    pub fn finish_with_result<T, E: std::fmt::Display>(self, result: Result<&T, &E>) {
        let duration_ms = self.start.elapsed().as_millis();

        match result {
            Ok(_) => {
                tracing::info!(
                    component = %self.component,
                    operation = %self.operation,
                    duration_ms = duration_ms,
                    "Operation completed successfully"
                );
            }
            Err(e) => {
                tracing::error!(
                    component = %self.component,
                    operation = %self.operation,
                    duration_ms = duration_ms,
                    error = %e,
                    "Operation failed"
                );
            }
        }
    }
}

/// Macro for logging initialization steps with consistent formatting.
#[macro_export]
macro_rules! log_init_step {
    ($step:expr, $total:expr, $name:expr, $detail:expr) => {
        tracing::info!(
            step = $step,
            total = $total,
            "[{}/{}] {} - {}",
            $step,
            $total,
            $name,
            $detail
        );
    };
    ($step:expr, $total:expr, $name:expr) => {
        tracing::info!(step = $step, total = $total, "[{}/{}] {}", $step, $total, $name);
    };
}
