//! Notebook cells.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use super::output::Output;

/// Open mapping of string keys to arbitrary JSON values.
///
/// Untyped passthrough: the core never interprets entries except through
/// explicit typed views such as [`ExecuteTime`](super::ExecuteTime).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Unique identifier for a cell within a notebook.
///
/// Freshly created cells get a UUID v4. Ids read from a persisted notebook
/// are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Kind of cell. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    /// Executable source.
    #[serde(rename = "code")]
    Code,
    /// Static text. Raw cells are read as prose, since neither kind runs.
    #[serde(rename = "markdown", alias = "raw")]
    Prose,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::Prose => f.write_str("markdown"),
        }
    }
}

/// A single notebook cell.
///
/// `id` and `kind` are immutable once the cell exists. Everything else is
/// changed only by the reducer in [`crate::state`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Cell {
    /// Missing ids (older format minors) are generated on load.
    #[serde(default = "CellId::generate")]
    id: CellId,

    #[serde(rename = "cell_type")]
    kind: CellKind,

    /// Source lines, each carrying its own trailing newline except the last.
    #[serde(default = "empty_source", deserialize_with = "deserialize_lines")]
    source: Vec<String>,

    #[serde(default)]
    metadata: Metadata,

    #[serde(default)]
    execution_count: Option<u32>,

    /// Present for code cells, absent for prose cells.
    #[serde(default)]
    outputs: Option<Vec<Output>>,
}

impl Cell {
    /// Create an empty cell with a fresh id.
    pub fn new(kind: CellKind) -> Self {
        Self::with_id(CellId::generate(), kind)
    }

    /// Create an empty cell with a caller-chosen id.
    ///
    /// Used when assembling documents outside the store (importers, tests).
    /// The store repairs duplicate ids when such a document is loaded.
    pub fn with_id(id: impl Into<CellId>, kind: CellKind) -> Self {
        Self {
            id: id.into(),
            kind,
            source: vec![String::new()],
            metadata: Metadata::new(),
            execution_count: None,
            outputs: match kind {
                CellKind::Code => Some(Vec::new()),
                CellKind::Prose => None,
            },
        }
    }

    /// Builder: replace the source with the lines of `text`.
    pub fn with_source(mut self, text: &str) -> Self {
        self.source = split_lines(text);
        self
    }

    pub fn id(&self) -> &CellId {
        &self.id
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_code(&self) -> bool {
        self.kind == CellKind::Code
    }

    /// Source lines as stored.
    pub fn source(&self) -> &[String] {
        &self.source
    }

    /// Source as a single string.
    ///
    /// Lines that lack a trailing newline are joined with one, so sources
    /// stored as bare lines read the same as newline-terminated ones.
    pub fn source_text(&self) -> String {
        let mut text = String::new();
        let mut previous: Option<&str> = None;
        for line in &self.source {
            if previous.is_some_and(|p| !p.ends_with('\n')) {
                text.push('\n');
            }
            text.push_str(line);
            previous = Some(line.as_str());
        }
        text
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn execution_count(&self) -> Option<u32> {
        self.execution_count
    }

    /// Recorded outputs. Always empty for prose cells.
    pub fn outputs(&self) -> &[Output] {
        self.outputs.as_deref().unwrap_or_default()
    }

    pub(crate) fn reassign_id(&mut self, id: CellId) {
        self.id = id;
    }

    pub(crate) fn set_source(&mut self, source: Vec<String>) {
        self.source = source;
    }

    pub(crate) fn merge_metadata(&mut self, patch: Metadata) {
        for (key, value) in patch {
            self.metadata.insert(key, value);
        }
    }

    pub(crate) fn set_execution_count(&mut self, count: u32) {
        self.execution_count = Some(count);
    }

    pub(crate) fn push_output(&mut self, output: Output) {
        self.outputs.get_or_insert_with(Vec::new).push(output);
    }

    pub(crate) fn clear_outputs(&mut self) {
        self.outputs = Some(Vec::new());
    }
}

// Prose cells carry neither `execution_count` nor `outputs` on disk.
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code = self.is_code();
        let fields = 4 + usize::from(code) + usize::from(self.outputs.is_some());

        let mut state = serializer.serialize_struct("Cell", fields)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("cell_type", &self.kind)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("metadata", &self.metadata)?;
        if code {
            state.serialize_field("execution_count", &self.execution_count)?;
        }
        if let Some(outputs) = &self.outputs {
            state.serialize_field("outputs", outputs)?;
        }
        state.end()
    }
}

fn empty_source() -> Vec<String> {
    vec![String::new()]
}

/// Split text into notebook-style lines.
///
/// Every line but the last keeps its `\n`, so concatenating the result
/// gives back the input. Empty text yields a single empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    text.split_inclusive('\n').map(String::from).collect()
}

/// Accept either a list of lines or a single multi-line string.
pub(crate) fn deserialize_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lines {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Lines::deserialize(deserializer)? {
        Lines::List(lines) => lines,
        Lines::Text(text) => split_lines(&text),
    })
}
