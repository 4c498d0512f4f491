//! Recorded execution timing, stored in cell metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cell::Metadata;
use crate::error::{Error, Result};

/// Metadata key under which execution timing is recorded.
pub const EXECUTE_TIME_KEY: &str = "ExecuteTime";

/// Start and end of the last execution of a cell (ISO 8601 on disk).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteTime {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl ExecuteTime {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    /// A metadata patch recording this timing.
    pub fn to_patch(&self) -> Result<Metadata> {
        let mut patch = Metadata::new();
        patch.insert(EXECUTE_TIME_KEY.to_string(), serde_json::to_value(self)?);
        Ok(patch)
    }

    /// Read timing from cell metadata. `Ok(None)` when nothing is recorded.
    pub fn from_metadata(metadata: &Metadata) -> Result<Option<Self>> {
        let Some(value) = metadata.get(EXECUTE_TIME_KEY) else {
            return Ok(None);
        };
        serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| Error::InvalidMetadata {
                key: EXECUTE_TIME_KEY.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_roundtrip() {
        let start = Utc::now();
        let end = start + chrono::Duration::milliseconds(1500);
        let timing = ExecuteTime::new(start, end);

        let patch = timing.to_patch().unwrap();
        assert!(patch[EXECUTE_TIME_KEY]["start_time"].is_string());

        let back = ExecuteTime::from_metadata(&patch).unwrap().unwrap();
        assert_eq!(back, timing);
        assert_eq!(back.duration().num_milliseconds(), 1500);
    }

    #[test]
    fn test_missing_and_invalid() {
        assert!(ExecuteTime::from_metadata(&Metadata::new()).unwrap().is_none());

        let mut bad = Metadata::new();
        bad.insert(EXECUTE_TIME_KEY.to_string(), serde_json::json!("yesterday"));
        assert!(matches!(
            ExecuteTime::from_metadata(&bad),
            Err(Error::InvalidMetadata { .. })
        ));
    }
}
