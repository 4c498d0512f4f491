//! Notebook document model: cells, outputs and the document itself.

mod cell;
mod document;
mod output;
mod timing;

pub use cell::{Cell, CellId, CellKind, Metadata, split_lines};
pub use document::{Document, DocumentMetadata, FormatVersion, KernelSpec, LanguageInfo};
pub use output::{MimeBundle, Output, TEXT_PLAIN};
pub use timing::{EXECUTE_TIME_KEY, ExecuteTime};
