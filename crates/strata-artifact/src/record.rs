//! Round records
//!
//! One [`RoundRecord`] is appended to a target's history at the end of every
//! round, whichever path the round took. Records are never edited.

use crate::hash::ContentHash;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// How the written artifact was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPath {
    /// First generation, composed from generated content alone
    Fresh,
    /// Generated content merged into the prior artifact
    Merged,
    /// Generation failed; the fallback template was written
    Fallback,
}

impl RoundPath {
    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoundPath::Fresh => "fresh",
            RoundPath::Merged => "merged",
            RoundPath::Fallback => "fallback",
        }
    }
}

impl fmt::Display for RoundPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one generation round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// Record identifier (sortable by creation time)
    pub id: Ulid,
    /// Round number, starting at 1
    pub round: u32,
    /// Task name
    pub task: String,
    /// Brief text supplied for this round
    pub brief: String,
    /// False when the fallback template was used
    pub success: bool,
    /// Path the round took
    pub path: RoundPath,
    /// Hash of the artifact text that was written
    pub artifact_hash: ContentHash,
    /// Completion time
    pub timestamp: DateTime<Utc>,
}

impl RoundRecord {
    /// Create a record stamped with the current time
    ///
    /// `success` is derived from `path`: only the fallback path is a failure.
    #[must_use]
    pub fn new(
        round: u32,
        task: impl Into<String>,
        brief: impl Into<String>,
        path: RoundPath,
        artifact_hash: ContentHash,
    ) -> Self {
        Self {
            id: Ulid::new(),
            round,
            task: task.into(),
            brief: brief.into(),
            success: path != RoundPath::Fallback,
            path,
            artifact_hash,
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp (history imports, tests)
    #[inline]
    #[must_use]
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fallback_is_unsuccessful() {
        let hash = ContentHash::of_text("x");
        assert!(!RoundRecord::new(1, "t", "b", RoundPath::Fallback, hash).success);
        assert!(RoundRecord::new(1, "t", "b", RoundPath::Fresh, hash).success);
        assert!(RoundRecord::new(2, "t", "b", RoundPath::Merged, hash).success);
    }

    #[test]
    fn json_line_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let record = RoundRecord::new(2, "Todo App", "add filters", RoundPath::Merged, ContentHash::of_text("x"))
            .at(ts);
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"path\":\"merged\""));
        assert!(json.contains("\"round\":2"));
        assert!(!json.contains('\n'));

        let back: RoundRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
