//! The reducer: `(state, operation) -> next state`.
//!
//! Total over well-typed input. An operation that does not apply (unknown
//! id, prose cell where a code cell is required) leaves the state as it was.

use std::sync::Arc;

use crate::model::{Cell, CellId, CellKind, Metadata, Output};

use super::operation::Operation;
use super::snapshot::State;

/// Result of reducing one operation.
#[derive(Debug)]
pub enum Transition {
    /// The operation produced a new state.
    Changed(State),
    /// The operation was a no-op.
    Unchanged,
}

impl Transition {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

/// Apply one operation to a state.
///
/// The input state is never modified. Untouched cells and the executing
/// set are shared with the returned state.
pub fn reduce(state: &State, operation: Operation) -> Transition {
    let mut next = state.clone();

    let changed = match operation {
        Operation::AddCell { kind, index } => add_cell(&mut next, kind, index),
        Operation::DeleteCell { cell_id } => delete_cell(&mut next, &cell_id),
        Operation::MoveCell { cell_id, new_index } => move_cell(&mut next, &cell_id, new_index),
        Operation::UpdateCell { cell_id, source } => {
            edit_cell(&mut next, &cell_id, Requires::AnyCell, |cell| cell.set_source(source))
        }
        Operation::UpdateCellMetadata { cell_id, patch } => update_metadata(&mut next, &cell_id, patch),
        Operation::ExecuteCell { cell_id } => execute_cell(&mut next, &cell_id),
        Operation::StartExecution { cell_id } => next.executing.start(&cell_id),
        Operation::StopExecution { cell_id } => next.executing.stop(&cell_id),
        Operation::SetActiveCell { cell_id } => set_active_cell(&mut next, cell_id),
        Operation::AppendOutput { cell_id, output } => append_output(&mut next, &cell_id, output),
        Operation::ClearOutputs { cell_id } => {
            edit_cell(&mut next, &cell_id, Requires::CodeCell, Cell::clear_outputs)
        }
    };

    if changed {
        Transition::Changed(next)
    } else {
        Transition::Unchanged
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Requires {
    AnyCell,
    CodeCell,
}

/// Copy-on-write edit of one cell. Marks the state dirty on success.
fn edit_cell(
    state: &mut State,
    id: &CellId,
    requires: Requires,
    edit: impl FnOnce(&mut Cell),
) -> bool {
    let Some(pos) = state.document.position(id) else {
        return false;
    };
    if requires == Requires::CodeCell && !state.document.cells()[pos].is_code() {
        return false;
    }

    edit(Arc::make_mut(&mut state.document.cells_mut()[pos]));
    state.is_dirty = true;
    true
}

fn add_cell(state: &mut State, kind: CellKind, index: Option<usize>) -> bool {
    let mut cell = Cell::new(kind);
    while state.document.contains(cell.id()) {
        cell = Cell::new(kind);
    }

    let len = state.document.len();
    let at = index.unwrap_or(len).min(len);
    let id = cell.id().clone();

    state.document.cells_mut().insert(at, Arc::new(cell));
    state.active_cell = Some(id);
    state.is_dirty = true;
    true
}

fn delete_cell(state: &mut State, id: &CellId) -> bool {
    let Some(pos) = state.document.position(id) else {
        return false;
    };
    state.document.cells_mut().remove(pos);

    // Focus moves to the cell that took the deleted cell's place, or to
    // the new last cell when the deleted one was last.
    if state.active_cell.as_ref() == Some(id) {
        let cells = state.document.cells();
        state.active_cell = cells
            .get(pos)
            .or_else(|| cells.last())
            .map(|c| c.id().clone());
    }

    state.is_dirty = true;
    true
}

fn move_cell(state: &mut State, id: &CellId, new_index: usize) -> bool {
    let Some(pos) = state.document.position(id) else {
        return false;
    };

    let cells = state.document.cells_mut();
    let cell = cells.remove(pos);
    let at = new_index.min(cells.len());
    cells.insert(at, cell);

    state.is_dirty = true;
    true
}

fn update_metadata(state: &mut State, id: &CellId, patch: Metadata) -> bool {
    edit_cell(state, id, Requires::AnyCell, |cell| cell.merge_metadata(patch))
}

fn execute_cell(state: &mut State, id: &CellId) -> bool {
    let count = state.execution_counter.saturating_add(1);
    if !edit_cell(state, id, Requires::CodeCell, |cell| cell.set_execution_count(count)) {
        return false;
    }
    state.execution_counter = count;
    true
}

fn set_active_cell(state: &mut State, id: Option<CellId>) -> bool {
    // Unknown ids clear the focus instead of leaving a dangling reference.
    let id = id.filter(|id| state.document.contains(id));
    if id == state.active_cell {
        return false;
    }
    state.active_cell = id;
    true
}

fn append_output(state: &mut State, id: &CellId, output: Output) -> bool {
    edit_cell(state, id, Requires::CodeCell, |cell| cell.push_output(output))
}
