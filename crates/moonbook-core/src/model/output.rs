//! Cell outputs.
//!
//! Mirrors the four output kinds of the persisted notebook format. MIME
//! bundles and output metadata are untyped passthrough.

use serde::{Deserialize, Serialize};

use super::cell::{Metadata, deserialize_lines, split_lines};

/// Mapping from MIME type (e.g. `text/plain`) to the rendered value.
pub type MimeBundle = serde_json::Map<String, serde_json::Value>;

/// MIME type used for plain text results.
pub const TEXT_PLAIN: &str = "text/plain";

/// One recorded result of running a code cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "output_type", rename_all = "snake_case")]
pub enum Output {
    /// Value produced by the cell.
    ExecuteResult {
        #[serde(default)]
        execution_count: Option<u32>,
        data: MimeBundle,
        #[serde(default)]
        metadata: Metadata,
    },

    /// Rich display data emitted while the cell ran.
    DisplayData {
        data: MimeBundle,
        #[serde(default)]
        metadata: Metadata,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution_count: Option<u32>,
    },

    /// Text written to a named stream such as `stdout`.
    Stream {
        name: String,
        #[serde(deserialize_with = "deserialize_lines")]
        text: Vec<String>,
    },

    /// Structured failure reported by the interpreter.
    Error {
        ename: String,
        evalue: String,
        #[serde(default)]
        traceback: Vec<String>,
    },
}

impl Output {
    /// A plain text execution result.
    pub fn text_result(text: impl Into<String>, execution_count: Option<u32>) -> Self {
        let mut data = MimeBundle::new();
        data.insert(TEXT_PLAIN.to_string(), serde_json::Value::String(text.into()));
        Self::ExecuteResult {
            execution_count,
            data,
            metadata: Metadata::new(),
        }
    }

    /// Stream output built from raw text.
    pub fn stream(name: impl Into<String>, text: &str) -> Self {
        Self::Stream {
            name: name.into(),
            text: split_lines(text),
        }
    }

    /// Error output.
    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: Vec<String>,
    ) -> Self {
        Self::Error {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback,
        }
    }

    /// The `output_type` tag as persisted.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ExecuteResult { .. } => "execute_result",
            Self::DisplayData { .. } => "display_data",
            Self::Stream { .. } => "stream",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Plain text representation, if the output has one.
    ///
    /// Bundle values may be a string or a list of lines.
    pub fn text_plain(&self) -> Option<String> {
        match self {
            Self::ExecuteResult { data, .. } | Self::DisplayData { data, .. } => {
                match data.get(TEXT_PLAIN)? {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Array(lines) => Some(
                        lines
                            .iter()
                            .filter_map(|l| l.as_str())
                            .collect::<String>(),
                    ),
                    _ => None,
                }
            }
            Self::Stream { text, .. } => Some(text.concat()),
            Self::Error { .. } => None,
        }
    }
}
