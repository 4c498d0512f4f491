//! Jupyter notebook (.ipynb) reading and writing.
//!
//! Shape validation happens here, before a document can reach the store.

use std::fs;
use std::path::Path;

use moonbook_core::Document;
use serde_json::Value;

use crate::error::{SyncError, SyncResult};

/// Check that a JSON value has the structural shape of a notebook.
///
/// Requires integer `nbformat` and `nbformat_minor`, an array of `cells`
/// and a non-null `metadata` object. Nothing deeper is checked here.
pub fn validate_shape(value: &Value) -> SyncResult<()> {
    let Some(obj) = value.as_object() else {
        return Err(SyncError::InvalidNotebook(
            "top-level value must be an object".to_string(),
        ));
    };

    for key in ["nbformat", "nbformat_minor"] {
        match obj.get(key) {
            Some(v) if v.is_u64() => {}
            Some(_) => {
                return Err(SyncError::InvalidNotebook(format!(
                    "'{}' must be a non-negative integer",
                    key
                )));
            }
            None => {
                return Err(SyncError::InvalidNotebook(format!("missing '{}'", key)));
            }
        }
    }

    if !obj.get("cells").is_some_and(Value::is_array) {
        return Err(SyncError::InvalidNotebook(
            "'cells' must be an array".to_string(),
        ));
    }

    if !obj.get("metadata").is_some_and(Value::is_object) {
        return Err(SyncError::InvalidNotebook(
            "'metadata' must be an object".to_string(),
        ));
    }

    Ok(())
}

/// Decode a JSON value into a document after validating its shape.
pub fn document_from_value(value: Value) -> SyncResult<Document> {
    validate_shape(&value)?;
    let document: Document = serde_json::from_value(value)?;
    Ok(document)
}

/// Parse notebook JSON text.
pub fn parse_document(json: &str) -> SyncResult<Document> {
    let value: Value = serde_json::from_str(json)?;
    document_from_value(value)
}

/// Serialize a document as pretty-printed notebook JSON.
pub fn to_json(document: &Document) -> SyncResult<String> {
    let mut json = serde_json::to_string_pretty(document)?;
    json.push('\n');
    Ok(json)
}

/// Read a notebook from a file.
pub fn read_document(path: impl AsRef<Path>) -> SyncResult<Document> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| SyncError::ReadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let document = parse_document(&content)?;

    tracing::info!("Read {} ({} cells)", path.display(), document.len());
    Ok(document)
}

/// Write a notebook to a file.
pub fn write_document(path: impl AsRef<Path>, document: &Document) -> SyncResult<()> {
    let path = path.as_ref();
    let json = to_json(document)?;
    fs::write(path, json).map_err(|e| SyncError::WriteError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    tracing::info!("Wrote {} ({} cells)", path.display(), document.len());
    Ok(())
}
