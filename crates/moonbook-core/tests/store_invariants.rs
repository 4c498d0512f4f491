//! Invariant checks over long operation sequences.
//!
//! Operations come from a proptest strategy. Targets are drawn as slots
//! (`@n`, the n-th existing cell at the time the operation is applied) or
//! as ids that never exist.

use std::collections::HashSet;

use moonbook_core::{
    Cell, CellId, CellKind, Document, DocumentMetadata, Metadata, Operation, Output, State, Store,
};
use proptest::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

fn slot(n: usize) -> CellId {
    CellId::from(format!("@{}", n))
}

/// Usually a slot, sometimes an id no cell will ever have.
fn target_strategy() -> impl Strategy<Value = CellId> {
    prop_oneof![
        7 => (0usize..8).prop_map(slot),
        1 => (0usize..3).prop_map(|n| CellId::from(format!("ghost-{}", n))),
    ]
}

fn kind_strategy() -> impl Strategy<Value = CellKind> {
    prop_oneof![Just(CellKind::Code), Just(CellKind::Prose)]
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        (kind_strategy(), proptest::option::of(0usize..8))
            .prop_map(|(kind, index)| Operation::AddCell { kind, index }),
        target_strategy().prop_map(|cell_id| Operation::DeleteCell { cell_id }),
        (target_strategy(), 0usize..8)
            .prop_map(|(cell_id, new_index)| Operation::MoveCell { cell_id, new_index }),
        (target_strategy(), 0u32..100).prop_map(|(cell_id, n)| Operation::UpdateCell {
            cell_id,
            source: vec![format!("value_{}", n)],
        }),
        (target_strategy(), 0u64..5).prop_map(|(cell_id, tag)| {
            let mut patch = Metadata::new();
            patch.insert("tag".into(), tag.into());
            Operation::UpdateCellMetadata { cell_id, patch }
        }),
        target_strategy().prop_map(|cell_id| Operation::ExecuteCell { cell_id }),
        (target_strategy(), any::<bool>()).prop_map(|(cell_id, start)| {
            if start {
                Operation::StartExecution { cell_id }
            } else {
                Operation::StopExecution { cell_id }
            }
        }),
        proptest::option::of(target_strategy())
            .prop_map(|cell_id| Operation::SetActiveCell { cell_id }),
        target_strategy().prop_map(|cell_id| Operation::AppendOutput {
            cell_id,
            output: Output::stream("stdout", "tick\n"),
        }),
        target_strategy().prop_map(|cell_id| Operation::ClearOutputs { cell_id }),
    ]
}

/// Replace a slot target with the id of the cell currently in that slot.
fn resolve(operation: Operation, state: &State) -> Operation {
    let ids = state.document().cell_ids();
    let fix = |id: CellId| -> CellId {
        match id.as_str().strip_prefix('@').and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if !ids.is_empty() => ids[n % ids.len()].clone(),
            Some(_) => CellId::from("ghost-empty"),
            None => id,
        }
    };

    match operation {
        Operation::DeleteCell { cell_id } => Operation::DeleteCell {
            cell_id: fix(cell_id),
        },
        Operation::MoveCell { cell_id, new_index } => Operation::MoveCell {
            cell_id: fix(cell_id),
            new_index,
        },
        Operation::UpdateCell { cell_id, source } => Operation::UpdateCell {
            cell_id: fix(cell_id),
            source,
        },
        Operation::UpdateCellMetadata { cell_id, patch } => Operation::UpdateCellMetadata {
            cell_id: fix(cell_id),
            patch,
        },
        Operation::ExecuteCell { cell_id } => Operation::ExecuteCell {
            cell_id: fix(cell_id),
        },
        Operation::StartExecution { cell_id } => Operation::StartExecution {
            cell_id: fix(cell_id),
        },
        Operation::StopExecution { cell_id } => Operation::StopExecution {
            cell_id: fix(cell_id),
        },
        Operation::SetActiveCell { cell_id } => Operation::SetActiveCell {
            cell_id: cell_id.map(fix),
        },
        Operation::AppendOutput { cell_id, output } => Operation::AppendOutput {
            cell_id: fix(cell_id),
            output,
        },
        Operation::ClearOutputs { cell_id } => Operation::ClearOutputs {
            cell_id: fix(cell_id),
        },
        add @ Operation::AddCell { .. } => add,
    }
}

fn code_store(names: &[String]) -> Store {
    let cells = names
        .iter()
        .map(|n| Cell::with_id(n.as_str(), CellKind::Code))
        .collect();
    Store::with_document(Document::from_cells(DocumentMetadata::default(), cells))
}

fn assert_invariants(state: &State) {
    let ids = state.document().cell_ids();
    let unique: HashSet<&CellId> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len(), "duplicate cell ids: {:?}", ids);

    if let Some(active) = state.active_cell() {
        assert!(
            state.document().contains(active),
            "active cell {} does not exist",
            active
        );
    }

    for cell in state.document().iter() {
        if !cell.is_code() {
            assert!(cell.outputs().is_empty(), "prose cell {} has outputs", cell.id());
            assert_eq!(cell.execution_count(), None);
        }
    }
}

fn three_cell_store() -> Store {
    Store::with_document(Document::from_cells(
        DocumentMetadata::default(),
        vec![
            Cell::with_id("A", CellKind::Code),
            Cell::with_id("B", CellKind::Prose),
            Cell::with_id("C", CellKind::Code),
        ],
    ))
}

// =============================================================================
// Invariant Tests
// =============================================================================

#[test]
fn test_start_stop_idempotent() {
    let mut store = three_cell_store();
    let id = CellId::from("A");

    let once = store.dispatch(Operation::StartExecution { cell_id: id.clone() });
    let twice = store.dispatch(Operation::StartExecution { cell_id: id.clone() });
    assert_eq!(once.executing(), twice.executing());
    assert_eq!(twice.executing().len(), 1);

    let once = store.dispatch(Operation::StopExecution { cell_id: id.clone() });
    let twice = store.dispatch(Operation::StopExecution { cell_id: id });
    assert_eq!(once.executing(), twice.executing());
    assert!(twice.executing().is_empty());
}

#[test]
fn test_concurrent_executions_tracked_independently() {
    let mut store = three_cell_store();
    store.dispatch(Operation::StartExecution { cell_id: "A".into() });
    store.dispatch(Operation::StartExecution { cell_id: "C".into() });
    let state = store.dispatch(Operation::StopExecution { cell_id: "A".into() });

    assert!(!state.is_executing(&"A".into()));
    assert!(state.is_executing(&"C".into()));
}

#[test]
fn test_document_serialization_roundtrip() {
    let mut store = three_cell_store();
    store.dispatch(Operation::UpdateCell {
        cell_id: "A".into(),
        source: vec!["let x = 1\n".into(), "x".into()],
    });
    store.dispatch(Operation::ExecuteCell { cell_id: "A".into() });
    store.dispatch(Operation::AppendOutput {
        cell_id: "A".into(),
        output: Output::text_result("1", Some(1)),
    });
    store.dispatch(Operation::AppendOutput {
        cell_id: "C".into(),
        output: Output::error("Error", "boom", vec!["line 1".into()]),
    });
    let mut patch = moonbook_core::Metadata::new();
    patch.insert("collapsed".into(), true.into());
    store.dispatch(Operation::UpdateCellMetadata {
        cell_id: "B".into(),
        patch,
    });

    let original = store.document().clone();
    let json = serde_json::to_string(&original).unwrap();
    let loaded: Document = serde_json::from_str(&json).unwrap();

    let reloaded = Store::with_document(loaded);
    assert_eq!(reloaded.document(), &original);
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn test_invariants_hold_across_random_sequences(
        operations in proptest::collection::vec(operation_strategy(), 1..200),
    ) {
        let mut store = three_cell_store();

        for operation in operations {
            let before = store.state();
            let operation = resolve(operation, &before);
            let is_execute = matches!(operation, Operation::ExecuteCell { .. });
            let target_is_code = operation
                .target()
                .and_then(|id| before.document().cell(id))
                .is_some_and(|c| c.is_code());

            let after = store.dispatch(operation);
            assert_invariants(&after);

            // Counter never decreases; executing a code cell adds exactly one.
            let expected = if is_execute && target_is_code {
                before.execution_counter() + 1
            } else {
                before.execution_counter()
            };
            prop_assert_eq!(after.execution_counter(), expected);
        }
    }

    #[test]
    fn test_move_preserves_relative_order(
        len in 1usize..8,
        from in 0usize..8,
        to in 0usize..10,
    ) {
        let from = from % len;
        let names: Vec<String> = (0..len).map(|i| format!("cell-{}", i)).collect();
        let mut store = code_store(&names);

        let moved = CellId::from(names[from].as_str());
        let state = store.dispatch(Operation::MoveCell {
            cell_id: moved.clone(),
            new_index: to,
        });

        let order = state.document().cell_ids();
        prop_assert_eq!(&order[to.min(len - 1)], &moved);

        let others: Vec<CellId> = order.into_iter().filter(|id| *id != moved).collect();
        let expected: Vec<CellId> = names
            .iter()
            .filter(|n| **n != names[from])
            .map(|n| CellId::from(n.as_str()))
            .collect();
        prop_assert_eq!(others, expected);
    }
}
