//! Clear command implementation for Moonbook CLI.

use std::path::Path;

use moonbook_core::{Operation, Store};
use moonbook_sync::{read_document, write_document};

use crate::colors;

/// Clear outputs of every code cell and save in place.
pub fn execute(notebook_path: &str) -> anyhow::Result<()> {
    let path = Path::new(notebook_path);
    if !path.exists() {
        anyhow::bail!("Notebook not found: {}", notebook_path);
    }

    let mut store = Store::with_document(read_document(path)?);
    let with_outputs: Vec<_> = store
        .document()
        .iter()
        .filter(|c| c.is_code() && !c.outputs().is_empty())
        .map(|c| c.id().clone())
        .collect();

    let cleared = with_outputs.len();
    for cell_id in with_outputs {
        store.dispatch(Operation::ClearOutputs { cell_id });
    }

    write_document(path, store.document())?;
    store.mark_saved();

    println!(
        "{}✓{} Cleared {} cell(s) in {}",
        colors::GREEN,
        colors::RESET,
        cleared,
        path.display()
    );

    Ok(())
}
