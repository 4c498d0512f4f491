//! Tracking of cells that are currently executing.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::model::CellId;

/// Set of cells currently mid-execution.
///
/// Membership is advisory (spinners, stop buttons), not a lock. The set is
/// shared between snapshots and only copied when it actually changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionTracker {
    cells: Arc<FxHashSet<CellId>>,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a cell as executing. Returns false if it already was.
    pub fn start(&mut self, id: &CellId) -> bool {
        if self.cells.contains(id) {
            return false;
        }
        Arc::make_mut(&mut self.cells).insert(id.clone())
    }

    /// Mark a cell as no longer executing. Returns false if it was not.
    pub fn stop(&mut self, id: &CellId) -> bool {
        if !self.cells.contains(id) {
            return false;
        }
        Arc::make_mut(&mut self.cells).remove(id)
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.cells.contains(id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Executing cells, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &CellId> {
        self.cells.iter()
    }
}
