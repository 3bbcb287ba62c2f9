use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::trim::TrimResult;

/// A trim kept for later processing.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSegment {
    pub start: f64,
    pub end: f64,
    pub trim: TrimResult,
    pub saved_at: DateTime<Utc>,
}

/// Channel label → last saved trim. Writes overwrite; only a new load
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct SegmentStore {
    segments: BTreeMap<String, SavedSegment>,
}

impl SegmentStore {
    /// Store a trim under `label`, returning the entry it replaced.
    pub fn save(&mut self, label: &str, start: f64, end: f64, trim: TrimResult) -> Option<SavedSegment> {
        self.segments.insert(
            label.to_string(),
            SavedSegment {
                start,
                end,
                trim,
                saved_at: Utc::now(),
            },
        )
    }

    pub fn get(&self, label: &str) -> Option<&SavedSegment> {
        self.segments.get(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SavedSegment)> {
        self.segments.iter().map(|(label, segment)| (label.as_str(), segment))
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
