//! Notebook file format for Moonbook.
//!
//! Converts between `.ipynb` JSON and [`moonbook_core::Document`].
//!
//! # Architecture
//!
//! ```text
//! notebook.ipynb ──► serde_json::Value ──► validate_shape ──► Document ──► Store
//!                                                                │
//! notebook.ipynb ◄──────────── to_json ◄─────────────────────────┘
//! ```

mod error;
mod ipynb;

pub use error::{SyncError, SyncResult};
pub use ipynb::{
    document_from_value, parse_document, read_document, to_json, validate_shape, write_document,
};

use std::path::{Path, PathBuf};

/// Extension used for notebook files.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Get the default notebook path for a name or path without extension.
pub fn default_notebook_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.extension().is_some_and(|e| e == NOTEBOOK_EXTENSION) {
        path.to_path_buf()
    } else {
        path.with_extension(NOTEBOOK_EXTENSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_notebook_path() {
        assert_eq!(
            default_notebook_path("analysis"),
            PathBuf::from("analysis.ipynb")
        );
        assert_eq!(
            default_notebook_path("/path/to/my_notebook.ipynb"),
            PathBuf::from("/path/to/my_notebook.ipynb")
        );
        assert_eq!(
            default_notebook_path("notes.mbt"),
            PathBuf::from("notes.ipynb")
        );
    }
}
