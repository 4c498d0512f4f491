//! Events published by a session.
//!
//! Hosts subscribe to these to redraw views or report progress.

use std::path::PathBuf;
use std::sync::Arc;

use moonbook_core::{CellId, State};

/// Messages broadcast to session subscribers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new snapshot was published.
    StateChanged { state: Arc<State> },

    /// A cell started running.
    ExecutionStarted { cell_id: CellId },

    /// A cell finished running, for any reason.
    ExecutionFinished {
        cell_id: CellId,
        outcome: ExecutionOutcome,
        duration_ms: u64,
    },

    /// The document was written to disk.
    Saved { path: PathBuf },

    /// A document was loaded. `None` for a fresh document.
    Loaded { path: Option<PathBuf> },
}

/// How a single cell execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The interpreter produced a value.
    ///
    /// `execution_count` is `None` when the cell was deleted mid-run.
    Completed { execution_count: Option<u32> },

    /// The interpreter reported a failure.
    Failed {
        execution_count: Option<u32>,
        name: String,
        message: String,
    },

    /// The run was cut short; no count and no result were recorded.
    Cancelled { reason: CancelReason },

    /// Prose cells are not executed.
    Skipped,
}

impl ExecutionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Count assigned to the cell, if any.
    pub fn execution_count(&self) -> Option<u32> {
        match self {
            Self::Completed { execution_count } | Self::Failed { execution_count, .. } => {
                *execution_count
            }
            Self::Cancelled { .. } | Self::Skipped => None,
        }
    }
}

/// Why a run was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The interrupt handle fired.
    Interrupted,
    /// The configured timeout elapsed.
    TimedOut,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Interrupted => write!(f, "interrupted"),
            Self::TimedOut => write!(f, "timed out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_counts() {
        assert_eq!(
            ExecutionOutcome::Completed {
                execution_count: Some(3)
            }
            .execution_count(),
            Some(3)
        );
        let failed = ExecutionOutcome::Failed {
            execution_count: Some(1),
            name: "TypeError".into(),
            message: "bad".into(),
        };
        assert!(failed.is_failed());
        assert_eq!(failed.execution_count(), Some(1));

        let cancelled = ExecutionOutcome::Cancelled {
            reason: CancelReason::TimedOut,
        };
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.execution_count(), None);
        assert_eq!(ExecutionOutcome::Skipped.execution_count(), None);
    }

    #[test]
    fn test_cancel_reason_display() {
        assert_eq!(CancelReason::Interrupted.to_string(), "interrupted");
        assert_eq!(CancelReason::TimedOut.to_string(), "timed out");
    }
}
