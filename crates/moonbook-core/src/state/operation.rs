//! The closed set of state transitions accepted by the store.

use serde::{Deserialize, Serialize};

use crate::model::{CellId, CellKind, Metadata, Output};

/// One atomic, named state transition.
///
/// Serializable so hosts can forward operations over a message channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Insert an empty cell. `index` is clamped; `None` appends.
    AddCell {
        kind: CellKind,
        #[serde(default)]
        index: Option<usize>,
    },

    /// Remove a cell.
    DeleteCell { cell_id: CellId },

    /// Relocate a cell. `new_index` is clamped.
    MoveCell { cell_id: CellId, new_index: usize },

    /// Replace a cell's source lines.
    UpdateCell { cell_id: CellId, source: Vec<String> },

    /// Merge a patch into a cell's metadata.
    UpdateCellMetadata { cell_id: CellId, patch: Metadata },

    /// Record a completed execution of a code cell.
    ExecuteCell { cell_id: CellId },

    /// Add a cell to the executing set.
    StartExecution { cell_id: CellId },

    /// Remove a cell from the executing set.
    StopExecution { cell_id: CellId },

    /// Focus a cell, or clear focus.
    SetActiveCell { cell_id: Option<CellId> },

    /// Append an output to a code cell.
    AppendOutput { cell_id: CellId, output: Output },

    /// Drop all outputs of a code cell.
    ClearOutputs { cell_id: CellId },
}

impl Operation {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddCell { .. } => "add_cell",
            Self::DeleteCell { .. } => "delete_cell",
            Self::MoveCell { .. } => "move_cell",
            Self::UpdateCell { .. } => "update_cell",
            Self::UpdateCellMetadata { .. } => "update_cell_metadata",
            Self::ExecuteCell { .. } => "execute_cell",
            Self::StartExecution { .. } => "start_execution",
            Self::StopExecution { .. } => "stop_execution",
            Self::SetActiveCell { .. } => "set_active_cell",
            Self::AppendOutput { .. } => "append_output",
            Self::ClearOutputs { .. } => "clear_outputs",
        }
    }

    /// The cell this operation targets, if any.
    pub fn target(&self) -> Option<&CellId> {
        match self {
            Self::AddCell { .. } => None,
            Self::SetActiveCell { cell_id } => cell_id.as_ref(),
            Self::DeleteCell { cell_id }
            | Self::MoveCell { cell_id, .. }
            | Self::UpdateCell { cell_id, .. }
            | Self::UpdateCellMetadata { cell_id, .. }
            | Self::ExecuteCell { cell_id }
            | Self::StartExecution { cell_id }
            | Self::StopExecution { cell_id }
            | Self::AppendOutput { cell_id, .. }
            | Self::ClearOutputs { cell_id } => Some(cell_id),
        }
    }
}
