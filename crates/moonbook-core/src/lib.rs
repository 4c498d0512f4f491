//! Core of the Moonbook notebook environment.
//!
//! This crate provides:
//! - The document model (cells, outputs, document metadata)
//! - The operation set and the pure reducer that applies it
//! - The state store with execution tracking and numbering
//!
//! Code execution is not part of this crate: hosts run the interpreter and
//! feed results back with [`Operation::AppendOutput`].

pub mod error;
pub mod model;
pub mod state;

pub use error::{Error, Result};
pub use model::{
    Cell, CellId, CellKind, Document, DocumentMetadata, ExecuteTime, FormatVersion, Metadata,
    Output,
};
pub use state::{ExecutionTracker, Operation, State, Store, Transition, reduce};
