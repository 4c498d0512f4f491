//! Immutable state snapshots.

use crate::model::{Cell, CellId, Document};

use super::tracker::ExecutionTracker;

/// Everything the store owns, as one logically immutable value.
///
/// A new `State` is produced for every applied operation; previously
/// published snapshots are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub(crate) document: Document,
    pub(crate) active_cell: Option<CellId>,
    pub(crate) execution_counter: u32,
    pub(crate) is_dirty: bool,
    pub(crate) executing: ExecutionTracker,
}

impl State {
    /// State for a fresh document with one empty code cell.
    pub fn new() -> Self {
        Self::load(Document::new())
    }

    /// State derived from a loaded document.
    ///
    /// Duplicate cell ids are repaired so the uniqueness invariant holds
    /// from the first snapshot on. Counters and flags start from zero.
    pub fn load(mut document: Document) -> Self {
        let repaired = document.ensure_unique_ids();
        if repaired > 0 {
            tracing::warn!("Repaired {} duplicate cell id(s) while loading", repaired);
        }

        let active_cell = document.cells().first().map(|c| c.id().clone());

        Self {
            document,
            active_cell,
            execution_counter: 0,
            is_dirty: false,
            executing: ExecutionTracker::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Id of the focused cell.
    pub fn active_cell(&self) -> Option<&CellId> {
        self.active_cell.as_ref()
    }

    /// The focused cell itself. `None` means no active cell.
    pub fn active_cell_data(&self) -> Option<&Cell> {
        self.active_cell
            .as_ref()
            .and_then(|id| self.document.cell(id))
    }

    /// Number of completed code-cell executions since the last load.
    pub fn execution_counter(&self) -> u32 {
        self.execution_counter
    }

    /// Whether the document changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn executing(&self) -> &ExecutionTracker {
        &self.executing
    }

    pub fn is_executing(&self, id: &CellId) -> bool {
        self.executing.contains(id)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
