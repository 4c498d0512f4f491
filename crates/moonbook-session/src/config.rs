//! Session configuration.

use std::time::Duration;

/// Capacity for the session event channel.
///
/// Subscribers that fall behind lose the oldest events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Stream name used for interpreter prints.
pub const DEFAULT_STREAM_NAME: &str = "stdout";

/// Session configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Maximum time a single cell may run before it is cancelled.
    pub execution_timeout: Option<Duration>,
    /// Whether to record `ExecuteTime` metadata for finished cells.
    pub record_timing: bool,
    /// Whether to clear a cell's outputs before running it.
    pub clear_outputs_before_run: bool,
    /// Capacity of the broadcast channel returned by `subscribe`.
    pub event_capacity: usize,
    /// Stream name for print outputs.
    pub stream_name: String,
    /// Whether `execute_all` stops at the first failing cell.
    pub stop_on_error: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            execution_timeout: None,
            record_timing: true,
            clear_outputs_before_run: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            stream_name: DEFAULT_STREAM_NAME.to_string(),
            stop_on_error: true,
        }
    }
}
