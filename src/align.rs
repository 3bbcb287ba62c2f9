use serde::Serialize;

use crate::triggers::{triggers_in_range, TriggerEvent};
use crate::trim::TrimResult;

/// Separator between labels of triggers that landed on the same sample.
pub const TRIGGER_SEPARATOR: &str = "; ";

/// One exported sample. `trigger` is empty when no event was attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub time: f64,
    pub value: f64,
    pub trigger: String,
}

/// A trimmed series with its in-range triggers attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlignedSegment {
    pub rows: Vec<ExportRow>,
    /// Triggers whose timestamp lies inside the window.
    pub triggers_in_range: usize,
    /// Triggers attached to a row. Equals `triggers_in_range` unless the
    /// trimmed series was empty.
    pub triggers_attached: usize,
}

impl AlignedSegment {
    /// Rows carrying at least one trigger label.
    pub fn labeled_rows(&self) -> impl Iterator<Item = &ExportRow> {
        self.rows.iter().filter(|row| !row.trigger.is_empty())
    }
}

/// Attach every trigger inside `[start, end]` to the trimmed sample closest
/// in time. Ties go to the earliest sample. Triggers never create rows of
/// their own; several may share one sample, joined with
/// [`TRIGGER_SEPARATOR`].
pub fn align_triggers(
    trimmed: &TrimResult,
    triggers: &[TriggerEvent],
    start: f64,
    end: f64,
) -> AlignedSegment {
    let in_range = triggers_in_range(triggers, start, end);

    let mut rows: Vec<ExportRow> = trimmed
        .timestamps
        .iter()
        .zip(&trimmed.samples)
        .map(|(&time, &value)| ExportRow {
            time,
            value,
            trigger: String::new(),
        })
        .collect();

    let mut attached = 0;
    for event in in_range {
        let Some(idx) = nearest_sample(&trimmed.timestamps, event.timestamp) else {
            continue;
        };
        let cell = &mut rows[idx].trigger;
        if !cell.is_empty() {
            cell.push_str(TRIGGER_SEPARATOR);
        }
        cell.push_str(&event.label);
        attached += 1;
    }

    rows.sort_by(|a, b| a.time.total_cmp(&b.time));

    AlignedSegment {
        rows,
        triggers_in_range: in_range.len(),
        triggers_attached: attached,
    }
}

fn nearest_sample(timestamps: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &t) in timestamps.iter().enumerate() {
        let distance = (t - target).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((idx, distance)),
        }
    }
    best.map(|(idx, _)| idx)
}
