//! The state store.
//!
//! Single owner, single writer. All mutation goes through [`Store::dispatch`];
//! readers hold `Arc<State>` snapshots that later operations never touch.

use std::sync::Arc;

use crate::model::{Cell, Document};

use super::operation::Operation;
use super::reducer::{Transition, reduce};
use super::snapshot::State;

/// Owns the live notebook state.
#[derive(Debug, Clone)]
pub struct Store {
    current: Arc<State>,
}

impl Store {
    /// Store holding a fresh document with one empty code cell.
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// Store holding a loaded document.
    pub fn with_document(document: Document) -> Self {
        Self {
            current: Arc::new(State::load(document)),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<State> {
        Arc::clone(&self.current)
    }

    pub fn document(&self) -> &Document {
        self.current.document()
    }

    /// The focused cell, if any.
    pub fn active_cell(&self) -> Option<&Cell> {
        self.current.active_cell_data()
    }

    /// Apply one operation and return the resulting snapshot.
    ///
    /// A no-op returns the previous snapshot unchanged.
    pub fn dispatch(&mut self, operation: Operation) -> Arc<State> {
        let name = operation.name();
        let target = operation.target().map(|id| id.to_string());

        match reduce(&self.current, operation) {
            Transition::Changed(next) => {
                tracing::debug!(
                    "Applied {} ({})",
                    name,
                    target.as_deref().unwrap_or("-")
                );
                self.current = Arc::new(next);
            }
            Transition::Unchanged => {
                tracing::debug!(
                    "Ignored {} ({}): not applicable",
                    name,
                    target.as_deref().unwrap_or("-")
                );
            }
        }

        self.state()
    }

    /// Replace everything with state derived from `document`.
    pub fn load(&mut self, document: Document) -> Arc<State> {
        tracing::info!("Loaded document with {} cells", document.len());
        self.current = Arc::new(State::load(document));
        self.state()
    }

    /// Replace everything with a fresh document.
    pub fn reset(&mut self) -> Arc<State> {
        self.load(Document::new())
    }

    /// Clear the dirty flag after the document was persisted.
    pub fn mark_saved(&mut self) -> Arc<State> {
        if self.current.is_dirty() {
            let mut next = State::clone(&self.current);
            next.is_dirty = false;
            self.current = Arc::new(next);
        }
        self.state()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
