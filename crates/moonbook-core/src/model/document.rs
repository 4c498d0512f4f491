//! The notebook document.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellId, CellKind, Metadata};

/// Structural compatibility marker, persisted as `nbformat`/`nbformat_minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatVersion {
    #[serde(rename = "nbformat")]
    pub major: u32,
    #[serde(rename = "nbformat_minor")]
    pub minor: u32,
}

impl FormatVersion {
    /// Version written for newly created documents.
    pub const CURRENT: Self = Self { major: 4, minor: 4 };
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

/// Kernel specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Metadata,
}

/// Language information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    #[serde(flatten)]
    pub extra: Metadata,
}

/// Document-level descriptor. Informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernelspec: Option<KernelSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_info: Option<LanguageInfo>,

    /// Keys this crate does not know about, kept for round-trip.
    #[serde(flatten)]
    pub extra: Metadata,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        Self {
            kernelspec: Some(KernelSpec {
                display_name: "MoonBit".to_string(),
                language: Some("moonbit".to_string()),
                name: "moonbit".to_string(),
                extra: Metadata::new(),
            }),
            language_info: Some(LanguageInfo {
                name: "moonbit".to_string(),
                version: Some("0.1.0".to_string()),
                mimetype: Some("text/x-moonbit".to_string()),
                file_extension: Some(".mbt".to_string()),
                extra: Metadata::new(),
            }),
            extra: Metadata::new(),
        }
    }
}

/// An ordered collection of cells plus descriptive metadata.
///
/// Cells are shared behind `Arc` so that state snapshots can reuse the
/// cells an operation did not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    cells: Vec<Arc<Cell>>,
    metadata: DocumentMetadata,
    #[serde(flatten)]
    format_version: FormatVersion,
}

impl Document {
    /// A fresh document holding one empty code cell.
    pub fn new() -> Self {
        Self::from_cells(DocumentMetadata::default(), vec![Cell::new(CellKind::Code)])
    }

    /// Assemble a document from existing cells.
    pub fn from_cells(metadata: DocumentMetadata, cells: Vec<Cell>) -> Self {
        Self {
            cells: cells.into_iter().map(Arc::new).collect(),
            metadata,
            format_version: FormatVersion::CURRENT,
        }
    }

    /// Builder: override the format version.
    pub fn with_format_version(mut self, version: FormatVersion) -> Self {
        self.format_version = version;
        self
    }

    pub fn format_version(&self) -> FormatVersion {
        self.format_version
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn cells(&self) -> &[Arc<Cell>] {
        &self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().map(|c| c.as_ref())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Index of the cell with the given id.
    pub fn position(&self, id: &CellId) -> Option<usize> {
        self.cells.iter().position(|c| c.id() == id)
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id() == id).map(|c| c.as_ref())
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.position(id).is_some()
    }

    /// Ids in document order.
    pub fn cell_ids(&self) -> Vec<CellId> {
        self.cells.iter().map(|c| c.id().clone()).collect()
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<Arc<Cell>> {
        &mut self.cells
    }

    /// Give every cell whose id was already used by an earlier cell a fresh id.
    ///
    /// Returns the number of cells that were renamed.
    pub(crate) fn ensure_unique_ids(&mut self) -> usize {
        let mut seen: FxHashSet<CellId> = FxHashSet::default();
        let mut repaired = 0;

        for index in 0..self.cells.len() {
            if seen.insert(self.cells[index].id().clone()) {
                continue;
            }

            let mut fresh = CellId::generate();
            while seen.contains(&fresh) || self.contains(&fresh) {
                fresh = CellId::generate();
            }
            tracing::warn!(
                "Duplicate cell id '{}' at index {}, reassigned to '{}'",
                self.cells[index].id(),
                index,
                fresh
            );
            Arc::make_mut(&mut self.cells[index]).reassign_id(fresh.clone());
            seen.insert(fresh);
            repaired += 1;
        }

        repaired
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_cells() -> Document {
        Document::from_cells(
            DocumentMetadata::default(),
            vec![
                Cell::with_id("a", CellKind::Code),
                Cell::with_id("b", CellKind::Prose),
                Cell::with_id("c", CellKind::Code),
            ],
        )
    }

    #[test]
    fn test_new_document_has_one_code_cell() {
        let doc = Document::new();
        assert_eq!(doc.len(), 1);
        assert!(doc.cells()[0].is_code());
        assert_eq!(doc.format_version(), FormatVersion { major: 4, minor: 4 });
    }

    #[test]
    fn test_structural_queries() {
        let doc = three_cells();
        assert_eq!(doc.position(&"b".into()), Some(1));
        assert_eq!(doc.position(&"zzz".into()), None);
        assert_eq!(doc.cell(&"c".into()).map(|c| c.kind()), Some(CellKind::Code));
        let expected: Vec<CellId> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(doc.cell_ids(), expected);
    }

    #[test]
    fn test_ensure_unique_ids() {
        let mut doc = Document::from_cells(
            DocumentMetadata::default(),
            vec![
                Cell::with_id("x", CellKind::Code),
                Cell::with_id("x", CellKind::Code),
                Cell::with_id("y", CellKind::Prose),
                Cell::with_id("x", CellKind::Prose),
            ],
        );

        assert_eq!(doc.ensure_unique_ids(), 2);

        let ids: FxHashSet<CellId> = doc.cell_ids().into_iter().collect();
        assert_eq!(ids.len(), 4);
        assert_eq!(doc.cells()[0].id().as_str(), "x");
        assert_eq!(doc.cells()[2].id().as_str(), "y");
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(Document::new()).unwrap();
        assert_eq!(json["nbformat"], 4);
        assert_eq!(json["nbformat_minor"], 4);
        assert_eq!(json["metadata"]["kernelspec"]["name"], "moonbit");
        assert_eq!(json["metadata"]["language_info"]["mimetype"], "text/x-moonbit");
        assert!(json["cells"].is_array());
    }

    #[test]
    fn test_unknown_metadata_preserved() {
        let json = r#"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {"authors": ["someone"], "kernelspec": {"display_name": "X", "name": "x"}},
            "cells": []
        }"#;
        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.format_version().minor, 5);
        assert!(doc.metadata().language_info.is_none());
        assert!(doc.metadata().extra.contains_key("authors"));

        let back = serde_json::to_value(&doc).unwrap();
        assert_eq!(back["metadata"]["authors"][0], "someone");
    }
}
